use std::{fmt, str::FromStr};

macro_rules! opcodes {
    ($($(#[$meta:meta])* $variant:ident => $name:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Opcode {
            $($(#[$meta])* $variant,)*
        }

        impl Opcode {
            /// Every opcode, in declaration order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            /// The textual mnemonic, as printed in IR dumps.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)*
                }
            }

            /// Look up an opcode by its exact mnemonic. Matching is case sensitive.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Opcode::$variant),)*
                    // Older dumps spell the compare-exchange out in full.
                    "atomiccmpxchg" => Some(Opcode::AtomicCmpXchg),
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    /// Return from the function. Has no successors.
    Ret => "ret",
    /// Conditional or unconditional branch.
    Br => "br",
    /// Multi-way branch on an integer value.
    Switch => "switch",
    /// Branch to a computed address, restricted to a list of possible destinations.
    IndirectBr => "indirectbr",
    Invoke => "invoke",
    Resume => "resume",
    Unreachable => "unreachable",
    CleanupRet => "cleanupret",
    CatchRet => "catchret",
    CatchSwitch => "catchswitch",
    CallBr => "callbr",

    FNeg => "fneg",

    /// Integer math.
    Add => "add",
    Sub => "sub",
    Mul => "mul",
    UDiv => "udiv",
    SDiv => "sdiv",
    URem => "urem",
    SRem => "srem",

    /// Floating point math.
    FAdd => "fadd",
    FSub => "fsub",
    FMul => "fmul",
    FDiv => "fdiv",
    FRem => "frem",

    /// Bitwise operations.
    Shl => "shl",
    LShr => "lshr",
    AShr => "ashr",
    And => "and",
    Or => "or",
    Xor => "xor",

    /// Memory access and addressing.
    Alloca => "alloca",
    Load => "load",
    Store => "store",
    GetElementPtr => "getelementptr",
    Fence => "fence",
    AtomicCmpXchg => "cmpxchg",
    AtomicRMW => "atomicrmw",

    /// Casts and such.
    Trunc => "trunc",
    ZExt => "zext",
    SExt => "sext",
    FPToUI => "fptoui",
    FPToSI => "fptosi",
    UIToFP => "uitofp",
    SIToFP => "sitofp",
    FPTrunc => "fptrunc",
    FPExt => "fpext",
    PtrToInt => "ptrtoint",
    IntToPtr => "inttoptr",
    BitCast => "bitcast",
    AddrSpaceCast => "addrspacecast",

    CleanupPad => "cleanuppad",
    CatchPad => "catchpad",

    /// Integer comparison. Returns i1.
    ICmp => "icmp",
    /// Floating point comparison, ordered or unordered depending on the predicate.
    FCmp => "fcmp",
    Phi => "phi",
    Call => "call",
    /// SSA form of conditional move.
    Select => "select",
    VAArg => "va_arg",
    ExtractElement => "extractelement",
    InsertElement => "insertelement",
    ShuffleVector => "shufflevector",
    ExtractValue => "extractvalue",
    InsertValue => "insertvalue",
    LandingPad => "landingpad",
    Freeze => "freeze",
}

impl Opcode {
    /// Terminators end a basic block. Only a terminator may carry the block's successor edges.
    pub const fn is_terminator(self) -> bool {
        matches!(
            self,
            Opcode::Ret
                | Opcode::Br
                | Opcode::Switch
                | Opcode::IndirectBr
                | Opcode::Invoke
                | Opcode::Resume
                | Opcode::Unreachable
                | Opcode::CleanupRet
                | Opcode::CatchRet
                | Opcode::CatchSwitch
                | Opcode::CallBr
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown opcode `{0}`")]
pub struct UnknownOpcode(pub String);

impl FromStr for Opcode {
    type Err = UnknownOpcode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::from_name(s).ok_or_else(|| UnknownOpcode(s.to_owned()))
    }
}
