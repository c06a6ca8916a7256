//! A small line-oriented text format for annotated CFGs.
//!
//! ```text
//! ; comments run to the end of the line
//! define @main
//! entry freq=10:
//!   alloca
//!   icmp
//!   br loop, exit!rare !weights 9, 1
//! loop freq=90:
//!   add
//!   br loop, exit
//! exit:
//!   ret
//! ```
//!
//! Block labels are local to their function and may be used before they are defined. A block
//! header without `freq=` has no recorded frequency. Successors are listed after the opcode of
//! the last instruction in a block; `!rare` marks an edge as rarely taken and `!weights` gives
//! one branch weight per successor.

use indexmap::IndexMap;

use crate::{
    block::{BlockId, Frequency},
    error::{ParseError, ParseErrorKind},
    function::Function,
    instruction::Instruction,
    opcode::Opcode,
};

struct PendingInst {
    line: usize,
    opcode: Opcode,
    targets: Vec<(String, Frequency)>,
    weights: Option<Vec<u32>>,
}

struct PendingBlock {
    frequency: Option<f64>,
    insts: Vec<PendingInst>,
}

struct PendingFunction {
    name: String,
    blocks: IndexMap<String, PendingBlock>,
}

impl PendingFunction {
    fn finish(self) -> Result<Function, ParseError> {
        let mut func = Function::new(self.name);

        for block in self.blocks.values() {
            func.add_block(block.frequency);
        }

        for (index, block) in self.blocks.values().enumerate() {
            let id = BlockId(index);
            let last = block.insts.len().saturating_sub(1);

            for (i, inst) in block.insts.iter().enumerate() {
                if !inst.targets.is_empty() && i != last {
                    return Err(ParseError {
                        line: inst.line,
                        kind: ParseErrorKind::SuccessorsNotOnTerminator,
                    });
                }

                if let Some(weights) = &inst.weights {
                    if weights.len() != inst.targets.len() {
                        return Err(ParseError {
                            line: inst.line,
                            kind: ParseErrorKind::WeightCountMismatch {
                                weights: weights.len(),
                                successors: inst.targets.len(),
                            },
                        });
                    }
                }

                for (label, freq) in &inst.targets {
                    let target = self.blocks.get_index_of(label.as_str()).ok_or_else(|| {
                        ParseError {
                            line: inst.line,
                            kind: ParseErrorKind::UndefinedLabel(label.clone()),
                        }
                    })?;
                    func.add_successor(id, (BlockId(target), *freq));
                }

                let built = match &inst.weights {
                    Some(weights) => Instruction::with_weights(inst.opcode, weights),
                    None => Instruction::new(inst.opcode),
                };
                func.block_mut(id).append(built);
            }
        }

        Ok(func)
    }
}

/// Parse every function in `source`, in order.
pub fn parse_module(source: &str) -> Result<Vec<Function>, ParseError> {
    let mut functions = Vec::new();
    let mut current: Option<PendingFunction> = None;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let err = |kind| ParseError { line, kind };

        let text = match raw.find(';') {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();

        if text.is_empty() {
            continue;
        }

        if let Some(rest) = text
            .strip_prefix("define")
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            let rest = rest.trim();
            let name = rest
                .strip_prefix('@')
                .filter(|name| !name.is_empty() && !name.contains(char::is_whitespace))
                .ok_or_else(|| err(ParseErrorKind::Unexpected(rest.to_owned())))?;

            if let Some(done) = current.take() {
                functions.push(done.finish()?);
            }

            current = Some(PendingFunction {
                name: name.to_owned(),
                blocks: IndexMap::new(),
            });
            continue;
        }

        if let Some(header) = text.strip_suffix(':') {
            let func = current
                .as_mut()
                .ok_or_else(|| err(ParseErrorKind::BlockOutsideFunction))?;

            let mut parts = header.split_whitespace();
            let label = parts
                .next()
                .ok_or_else(|| err(ParseErrorKind::Unexpected(":".to_owned())))?;

            let mut frequency = None;
            for part in parts {
                let value = part
                    .strip_prefix("freq=")
                    .ok_or_else(|| err(ParseErrorKind::Unexpected(part.to_owned())))?;
                frequency = Some(parse_frequency(value).ok_or_else(|| {
                    err(ParseErrorKind::InvalidNumber(value.to_owned()))
                })?);
            }

            if func.blocks.contains_key(label) {
                return Err(err(ParseErrorKind::DuplicateLabel(label.to_owned())));
            }

            func.blocks.insert(
                label.to_owned(),
                PendingBlock {
                    frequency,
                    insts: Vec::new(),
                },
            );
            continue;
        }

        let block = current
            .as_mut()
            .and_then(|func| func.blocks.last_mut())
            .map(|(_, block)| block)
            .ok_or_else(|| err(ParseErrorKind::InstructionOutsideBlock))?;

        let inst = parse_instruction(text).map_err(err)?;
        block.insts.push(PendingInst { line, ..inst });
    }

    if let Some(done) = current.take() {
        functions.push(done.finish()?);
    }

    Ok(functions)
}

fn parse_frequency(text: &str) -> Option<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|freq| freq.is_finite() && *freq >= 0.0)
}

fn parse_instruction(text: &str) -> Result<PendingInst, ParseErrorKind> {
    let (body, weights) = match text.find("!weights") {
        Some(pos) => {
            let list = &text[pos + "!weights".len()..];
            let weights = list
                .split(',')
                .map(str::trim)
                .map(|w| {
                    w.parse::<u32>()
                        .map_err(|_| ParseErrorKind::InvalidNumber(w.to_owned()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            (&text[..pos], Some(weights))
        }
        None => (text, None),
    };

    let body = body.trim();
    let (mnemonic, rest) = match body.find(char::is_whitespace) {
        Some(pos) => (&body[..pos], body[pos..].trim()),
        None => (body, ""),
    };

    let opcode = Opcode::from_name(mnemonic)
        .ok_or_else(|| ParseErrorKind::UnknownOpcode(mnemonic.to_owned()))?;

    let mut targets = Vec::new();
    if !rest.is_empty() {
        for target in rest.split(',').map(str::trim) {
            let (label, freq) = match target.strip_suffix("!rare") {
                Some(label) => (label, Frequency::Rare),
                None => (target, Frequency::Normal),
            };

            if label.is_empty() || label.contains(char::is_whitespace) || label.contains('!') {
                return Err(ParseErrorKind::Unexpected(target.to_owned()));
            }

            targets.push((label.to_owned(), freq));
        }
    }

    Ok(PendingInst {
        line: 0,
        opcode,
        targets,
        weights,
    })
}
