use crate::air::{Arg, Instr, Program};
use crate::error::{ErrorKind, LoadError, SyntaxError};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::operand::Operand;
use crate::ops::OpTable;
use crate::span::Span;
use crate::symbol::Mnemonic;

/// Most operands any instruction takes.
const MAX_OPERANDS: usize = 2;

/// One source line, split but not yet checked against the instruction table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedLine<'a> {
    pub label: Option<&'a str>,
    /// Uppercased mnemonic and its span
    pub mnemonic: Option<(String, Span)>,
    pub operands: Vec<Token<'a>>,
}

impl DecodedLine<'_> {
    /// Mnemonic through last operand.
    fn span(&self) -> Option<Span> {
        let (_, first) = self.mnemonic.as_ref()?;
        Some(
            self.operands
                .last()
                .map_or(*first, |last| first.join(last.span)),
        )
    }
}

/// Lines with nothing to decode.
pub fn should_skip(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with(';')
}

/// Split a line into `[label:] MNEMONIC [op1[, op2]]`.
pub fn decode_line(line: &str, base: usize) -> Result<DecodedLine<'_>, (ErrorKind, Span)> {
    let syntax = |error, span| (ErrorKind::Syntax(error), span);

    let tokens: Vec<Token<'_>> = tokenize(line, base)
        .filter(|t| t.kind != TokenKind::Whitespace)
        .take_while(|t| t.kind != TokenKind::Comment)
        .collect();
    let is_word = |t: &Token<'_>| t.kind == TokenKind::Word;

    let mut decoded = DecodedLine {
        label: None,
        mnemonic: None,
        operands: Vec::new(),
    };

    // Label
    let mut rest = tokens.as_slice();
    match rest {
        [first, ..] if is_word(first) && first.text.starts_with(':') => {
            return Err(syntax(SyntaxError::DetachedColon, first.span));
        }
        [first, ..] if is_word(first) && first.text.ends_with(':') => {
            let name = &first.text[..first.text.len() - 1];
            if !is_label(name) {
                return Err(syntax(SyntaxError::InvalidLabel, first.span));
            }
            decoded.label = Some(name);
            rest = &rest[1..];
        }
        [_, second, ..] if is_word(second) && second.text.starts_with(':') => {
            return Err(syntax(SyntaxError::DetachedColon, second.span));
        }
        _ => (),
    }

    // Mnemonic
    let Some((token, rest)) = rest.split_first() else {
        return Ok(decoded);
    };
    if token.kind == TokenKind::Comma {
        return Err(syntax(SyntaxError::UnexpectedComma, token.span));
    }
    if token.text.contains(':') {
        return Err(syntax(SyntaxError::InvalidLabel, token.span));
    }
    check_leading_char(token).map_err(|ch| syntax(SyntaxError::UnexpectedChar(ch), token.span))?;
    decoded.mnemonic = Some((token.text.to_ascii_uppercase(), token.span));

    // Operands
    let mut after_comma = false;
    let mut last_comma = None;
    for &token in rest {
        match token.kind {
            TokenKind::Comma => {
                if decoded.operands.is_empty() || after_comma {
                    return Err(syntax(SyntaxError::UnexpectedComma, token.span));
                }
                after_comma = true;
                last_comma = Some(token.span);
            }
            _ => {
                if decoded.operands.len() == MAX_OPERANDS {
                    return Err(syntax(SyntaxError::TooManyOperands, token.span));
                }
                check_leading_char(&token)
                    .map_err(|ch| syntax(SyntaxError::UnexpectedChar(ch), token.span))?;
                decoded.operands.push(token);
                after_comma = false;
            }
        }
    }
    if after_comma {
        if let Some(span) = last_comma {
            return Err(syntax(SyntaxError::UnexpectedComma, span));
        }
    }

    Ok(decoded)
}

/// Words start with a letter, a digit, `[` or `-`.
fn check_leading_char(token: &Token<'_>) -> Result<(), char> {
    match token.text.chars().next() {
        Some(ch) if !(ch.is_ascii_alphanumeric() || ch == '[' || ch == '-') => Err(ch),
        _ => Ok(()),
    }
}

fn is_label(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builds the instruction list and label index from the whole source in one pass.
pub struct AsmParser<'a> {
    /// Reference to the source file
    src: &'a str,
    table: &'a OpTable,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str, table: &'a OpTable) -> Self {
        AsmParser { src, table }
    }

    pub fn parse(self) -> Result<Program, LoadError> {
        let mut program = Program::new();
        let mut offs = 0;
        for (idx, raw) in self.src.split_inclusive('\n').enumerate() {
            let base = offs;
            offs += raw.len();
            let line = raw.trim_end_matches(['\n', '\r']);
            if should_skip(line) {
                continue;
            }
            let line_no = idx + 1;
            let fail = |kind, span| LoadError {
                kind,
                line: line_no,
                span,
            };

            let decoded = decode_line(line, base).map_err(|(kind, span)| fail(kind, span))?;
            if let Some(label) = decoded.label {
                if !program.add_label(label) {
                    let span = Span::new(base + line.len() - line.trim_start().len(), label.len());
                    return Err(fail(ErrorKind::DuplicateLabel(label.to_owned()), span));
                }
            }
            let Some(span) = decoded.span() else {
                continue;
            };
            let Some((name, name_span)) = decoded.mnemonic else {
                continue;
            };

            let arity = name
                .parse::<Mnemonic>()
                .ok()
                .and_then(|m| self.table.arity(m).map(|arity| (m, arity)));
            let Some((mnemonic, arity)) = arity else {
                return Err(fail(ErrorKind::UnknownInstruction(name), name_span));
            };
            if decoded.operands.len() != arity {
                let kind = ErrorKind::ArityMismatch {
                    mnemonic,
                    expected: arity,
                    found: decoded.operands.len(),
                };
                return Err(fail(kind, span));
            }
            let is_mem = |t: &Token<'_>| Operand::classify(t.text).is_ok_and(|op| op.is_mem());
            if mnemonic == Mnemonic::Xchg && decoded.operands.iter().all(is_mem) {
                return Err(fail(ErrorKind::Syntax(SyntaxError::BothOperandsMemory), span));
            }

            program.add_instr(Instr {
                mnemonic,
                args: decoded
                    .operands
                    .iter()
                    .map(|token| Arg {
                        text: token.text.to_owned(),
                        span: token.span,
                    })
                    .collect(),
                line: line_no,
                span,
            });
        }
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(line: &str) -> Result<(Option<&str>, Option<String>, Vec<&str>), ErrorKind> {
        decode_line(line, 0)
            .map(|d| {
                (
                    d.label,
                    d.mnemonic.map(|(m, _)| m),
                    d.operands.iter().map(|t| t.text).collect(),
                )
            })
            .map_err(|(kind, _)| kind)
    }

    fn parse(src: &str) -> Result<Program, LoadError> {
        let table = OpTable::standard().unwrap();
        AsmParser::new(src, &table).parse()
    }

    #[test]
    fn decodes_full_line() {
        assert_eq!(
            decode("L1: mov ax, [12] ; load"),
            Ok((Some("L1"), Some("MOV".into()), vec!["ax", "[12]"]))
        );
        assert_eq!(
            decode("  push   bx"),
            Ok((None, Some("PUSH".into()), vec!["bx"]))
        );
        assert_eq!(decode("end:"), Ok((Some("end"), None, vec![])));
        assert_eq!(
            decode("add ax 5"),
            Ok((None, Some("ADD".into()), vec!["ax", "5"]))
        );
    }

    #[test]
    fn comment_truncates_token() {
        assert_eq!(
            decode("mov ax,5;five"),
            Ok((None, Some("MOV".into()), vec!["ax", "5"]))
        );
        assert_eq!(decode("hlt;"), Ok((None, Some("HLT".into()), vec![])));
    }

    #[test]
    fn decoding_is_deterministic() {
        let line = "loop: sub cx, 1";
        assert_eq!(decode_line(line, 3), decode_line(line, 3));
    }

    #[test]
    fn syntax_errors() {
        use SyntaxError::*;
        for (line, error) in [
            ("mov ax, bx, cx", TooManyOperands),
            ("mov ax, *5", UnexpectedChar('*')),
            ("mov , ax", UnexpectedComma),
            ("mov ax,, 5", UnexpectedComma),
            ("mov ax, 5,", UnexpectedComma),
            (", nop", UnexpectedComma),
            ("L1 : nop", DetachedColon),
            (":L1 nop", DetachedColon),
            ("L-1: nop", InvalidLabel),
            (": nop", DetachedColon),
            ("*mov ax, 1", UnexpectedChar('*')),
            ("L1: .nop", UnexpectedChar('.')),
        ] {
            assert_eq!(decode(line), Err(ErrorKind::Syntax(error)), "{line}");
        }
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert!(should_skip(""));
        assert!(should_skip("   \t"));
        assert!(should_skip("  ; note"));
        assert!(!should_skip("nop ; note"));
    }

    #[test]
    fn loads_labels_in_one_pass() {
        let program = parse(
            "; counter\n\
             start: mov cx, 3\n\
             \n\
             again: dec cx\n\
             jnz again\n\
             jmp done\n\
             done:\n",
        )
        .unwrap();
        assert_eq!(program.len(), 4);
        assert_eq!(program.label("start"), Some(0));
        assert_eq!(program.label("again"), Some(1));
        assert_eq!(program.label("done"), Some(4));
        let instr = program.get(2).unwrap();
        assert_eq!(instr.mnemonic, Mnemonic::Jnz);
        assert_eq!(instr.line, 5);
        assert_eq!(instr.to_string(), "JNZ again");
    }

    #[test]
    fn label_only_line_names_next_instruction() {
        let program = parse("top:\n\n  nop\nhlt").unwrap();
        assert_eq!(program.label("top"), Some(0));
        assert_eq!(program.get(1).map(|i| i.line), Some(4));
    }

    #[test]
    fn spans_point_into_source() {
        let src = "nop\r\nmov  ax, 10\n";
        let program = parse(src).unwrap();
        let instr = program.get(1).unwrap();
        assert_eq!(&src[instr.span.range()], "mov  ax, 10");
        assert_eq!(&src[instr.args[1].span.range()], "10");
    }

    #[test]
    fn load_errors() {
        let error = parse("nop\nfoo ax\n").unwrap_err();
        assert_eq!(error.kind, ErrorKind::UnknownInstruction("FOO".into()));
        assert_eq!(error.line, 2);

        let error = parse("a: nop\nb: nop\na: hlt").unwrap_err();
        assert_eq!(error.kind, ErrorKind::DuplicateLabel("a".into()));
        assert_eq!(error.line, 3);

        let error = parse("push ax, bx").unwrap_err();
        assert_eq!(
            error.kind,
            ErrorKind::ArityMismatch {
                mnemonic: Mnemonic::Push,
                expected: 1,
                found: 2
            }
        );

        let error = parse("jmp skip\nxchg [1], [2]\nskip: hlt").unwrap_err();
        assert_eq!(error.kind, ErrorKind::Syntax(SyntaxError::BothOperandsMemory));
        assert_eq!(error.line, 2);
        assert!(parse("xchg [1], ax\nxchg bx, [2]").is_ok());

        let error = parse("hlt\nmov ax bx cx").unwrap_err();
        assert_eq!(error.kind, ErrorKind::Syntax(SyntaxError::TooManyOperands));
        assert_eq!(error.line, 2);
    }
}
