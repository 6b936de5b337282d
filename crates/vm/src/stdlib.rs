//! Native functions available to every program.

use std::io::{self, BufRead, Write};
use std::rc::Rc;

use aurora_bytecode::error::Result;
use aurora_bytecode::{ArgCount, Value, ValueError, ValueKind};
use itertools::Itertools;
use smol_str::SmolStr;

use crate::Globals;

type Native = fn(Vec<Value>) -> Result<Value>;

/// Bind every native function of the standard library in `globals`.
pub fn install(globals: &mut Globals) {
    let natives: &[(&str, ArgCount, Native)] = &[
        ("print", ArgCount::Between(0, usize::MAX), print),
        ("push_back", ArgCount::Exact(2), push_back),
        ("pop_back", ArgCount::Exact(1), pop_back),
        ("size", ArgCount::Exact(1), size),
        ("range", ArgCount::Between(1, 3), range),
        ("split", ArgCount::Exact(2), split),
        ("join", ArgCount::Exact(2), join),
        ("replace", ArgCount::Exact(3), replace),
        ("substr", ArgCount::Exact(3), substr),
        ("find", ArgCount::Exact(2), find),
        ("find_last", ArgCount::Exact(2), find_last),
        ("contains?", ArgCount::Exact(2), contains),
        ("empty?", ArgCount::Exact(1), empty),
        ("to_string", ArgCount::Exact(1), to_string),
        ("input", ArgCount::Exact(0), input),
        ("input_int", ArgCount::Exact(0), input_int),
        ("input_double", ArgCount::Exact(0), input_double),
        ("input_bool", ArgCount::Exact(0), input_bool),
        ("read?", ArgCount::Exact(1), read_word),
        ("read_delim?", ArgCount::Exact(1), read_delim),
    ];
    for &(name, arity, f) in natives {
        let native = Value::native(name, move |args| {
            ValueError::check_arity(arity, &args)?;
            f(args)
        });
        globals.insert(name.into(), native);
    }
    globals.insert("NaN".into(), Value::Number(f64::NAN));
}

/// A fresh global table holding the standard library.
pub fn globals() -> Globals {
    let mut globals = Globals::default();
    install(&mut globals);
    globals
}

fn io_error(e: io::Error) -> ValueError {
    ValueError::native(e.to_string())
}

fn string_arg(args: &[Value], idx: usize) -> Result<&SmolStr> {
    args[idx].as_string()
}

/// Byte offset to character offset.
fn char_index(s: &str, byte: usize) -> f64 {
    s[..byte].chars().count() as f64
}

/// The line printed by `print`: every argument rendered, without separators.
pub fn render_line(args: &[Value]) -> String {
    args.iter().join("")
}

fn print(args: Vec<Value>) -> Result<Value> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", render_line(&args)).map_err(io_error)?;
    Ok(Value::Nil)
}

fn push_back(mut args: Vec<Value>) -> Result<Value> {
    let item = args.pop().unwrap_or_default();
    let mut list = args.swap_remove(0).into_list()?;
    Rc::make_mut(&mut list).push(item);
    Ok(Value::List(list))
}

fn pop_back(mut args: Vec<Value>) -> Result<Value> {
    let mut list = args.swap_remove(0).into_list()?;
    if list.is_empty() {
        return Err(ValueError::native("Cannot pop from empty list."));
    }
    Rc::make_mut(&mut list).pop();
    Ok(Value::List(list))
}

fn size(args: Vec<Value>) -> Result<Value> {
    let len = match &args[0] {
        Value::List(list) => list.len(),
        Value::String(s) => s.chars().count(),
        other => {
            return Err(ValueError::TypeMismatch {
                expected: ValueKind::List,
                got: other.kind(),
            })
        }
    };
    Ok(Value::Number(len as f64))
}

/// Integers from `start` (inclusive) towards `end` (exclusive).
fn range(args: Vec<Value>) -> Result<Value> {
    let nums = args
        .iter()
        .map(|v| v.as_number().map(f64::trunc))
        .collect::<Result<Vec<_>>>()?;
    let (start, end, step) = match nums[..] {
        [end] => (0.0, end, 1.0),
        [start, end] => (start, end, 1.0),
        [start, end, step] => (start, end, step),
        _ => {
            return Err(ValueError::Arity {
                expected: ArgCount::Between(1, 3),
                got: nums.len(),
            })
        }
    };
    if step == 0.0 || step.is_nan() {
        return Err(ValueError::native("Range step cannot be zero."));
    }

    let mut list = vec![];
    let mut i = start;
    while (step > 0.0 && i < end) || (step < 0.0 && i > end) {
        list.push(Value::Number(i));
        i += step;
    }
    Ok(Value::list(list))
}

fn split(args: Vec<Value>) -> Result<Value> {
    let s = string_arg(&args, 0)?;
    let delim = string_arg(&args, 1)?;
    let pieces: Vec<Value> = if delim.is_empty() {
        s.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        s.split(delim.as_str()).map(Value::from).collect()
    };
    Ok(Value::list(pieces))
}

fn join(args: Vec<Value>) -> Result<Value> {
    let list = args[0].as_list()?;
    let delim = string_arg(&args, 1)?;
    let parts = list
        .iter()
        .map(|v| v.as_string().map(SmolStr::as_str))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::from(parts.join(delim.as_str())))
}

/// Replaces the first occurrence only.
fn replace(args: Vec<Value>) -> Result<Value> {
    let s = string_arg(&args, 0)?;
    let from = string_arg(&args, 1)?;
    let to = string_arg(&args, 2)?;
    Ok(Value::from(s.replacen(from.as_str(), to, 1)))
}

/// Substring between two character indices. Negative indices count from the end.
fn substr(args: Vec<Value>) -> Result<Value> {
    let s = string_arg(&args, 0)?;
    let len = s.chars().count() as f64;
    let resolve = |v: &Value| -> Result<f64> {
        let i = v.as_number()?.trunc();
        Ok(if i < 0.0 { len + i } else { i })
    };
    let start = resolve(&args[1])?;
    let end = resolve(&args[2])?;
    if start < 0.0 || end < start || end > len {
        return Err(ValueError::native("Invalid substring range."));
    }
    let sub: String = s
        .chars()
        .skip(start as usize)
        .take((end - start) as usize)
        .collect();
    Ok(Value::from(sub))
}

fn find(args: Vec<Value>) -> Result<Value> {
    let s = string_arg(&args, 0)?;
    let sub = string_arg(&args, 1)?;
    Ok(Value::Number(
        s.find(sub.as_str()).map_or(-1.0, |b| char_index(s, b)),
    ))
}

fn find_last(args: Vec<Value>) -> Result<Value> {
    let s = string_arg(&args, 0)?;
    let sub = string_arg(&args, 1)?;
    Ok(Value::Number(
        s.rfind(sub.as_str()).map_or(-1.0, |b| char_index(s, b)),
    ))
}

fn contains(args: Vec<Value>) -> Result<Value> {
    let s = string_arg(&args, 0)?;
    let sub = string_arg(&args, 1)?;
    Ok(Value::Boolean(s.contains(sub.as_str())))
}

fn empty(args: Vec<Value>) -> Result<Value> {
    match &args[0] {
        Value::String(s) => Ok(Value::Boolean(s.is_empty())),
        Value::List(list) => Ok(Value::Boolean(list.is_empty())),
        other => Err(ValueError::TypeMismatch {
            expected: ValueKind::String,
            got: other.kind(),
        }),
    }
}

fn to_string(args: Vec<Value>) -> Result<Value> {
    Ok(Value::from(args[0].to_string()))
}

fn input(_: Vec<Value>) -> Result<Value> {
    let line = read_line(&mut io::stdin().lock()).map_err(io_error)?;
    Ok(Value::from(line))
}

fn input_int(_: Vec<Value>) -> Result<Value> {
    let line = read_line(&mut io::stdin().lock()).map_err(io_error)?;
    Ok(Value::Number(parse_number(&line).trunc()))
}

fn input_double(_: Vec<Value>) -> Result<Value> {
    let line = read_line(&mut io::stdin().lock()).map_err(io_error)?;
    Ok(Value::Number(parse_number(&line)))
}

fn input_bool(_: Vec<Value>) -> Result<Value> {
    let line = read_line(&mut io::stdin().lock()).map_err(io_error)?;
    Ok(parse_bool(&line))
}

/// `true` if the next whitespace-separated word of the input equals the
/// argument, `nil` at the end of input.
fn read_word(args: Vec<Value>) -> Result<Value> {
    let expected = string_arg(&args, 0)?;
    let word = next_word(&mut io::stdin().lock()).map_err(io_error)?;
    Ok(word.map_or(Value::Nil, |w| Value::Boolean(w == expected.as_str())))
}

/// Reads up to the first character of the argument and compares what was
/// read with the argument. `nil` at the end of input.
fn read_delim(args: Vec<Value>) -> Result<Value> {
    let expected = string_arg(&args, 0)?;
    let delim = match expected.as_bytes().first() {
        Some(&b) if b.is_ascii() => b,
        _ => {
            return Err(ValueError::native(
                "Delimiter must start with an ASCII character.",
            ))
        }
    };
    let chunk = read_until(&mut io::stdin().lock(), delim).map_err(io_error)?;
    Ok(chunk.map_or(Value::Nil, |c| Value::Boolean(c == expected.as_str())))
}

/// Number parsing of the input natives. Unparsable text is NaN.
pub(crate) fn parse_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

pub(crate) fn parse_bool(s: &str) -> Value {
    match s.trim() {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => Value::Nil,
    }
}

/// One line without its terminator. Empty at the end of input.
pub(crate) fn read_line<R: BufRead>(r: &mut R) -> io::Result<String> {
    let mut line = String::new();
    r.read_line(&mut line)?;
    let trimmed = line.trim_end_matches(&['\n', '\r'][..]).len();
    line.truncate(trimmed);
    Ok(line)
}

/// Skip whitespace, then read up to the next whitespace, which is left unread.
pub(crate) fn next_word<R: BufRead>(r: &mut R) -> io::Result<Option<String>> {
    let mut word = Vec::new();
    loop {
        let buf = r.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        let mut used = 0;
        let mut done = false;
        for &b in buf {
            if b.is_ascii_whitespace() {
                if !word.is_empty() {
                    done = true;
                    break;
                }
            } else {
                word.push(b);
            }
            used += 1;
        }
        r.consume(used);
        if done {
            break;
        }
    }
    Ok((!word.is_empty()).then(|| String::from_utf8_lossy(&word).into_owned()))
}

/// Read up to and including `delim`, returning what came before it.
pub(crate) fn read_until<R: BufRead>(r: &mut R, delim: u8) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if r.read_until(delim, &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&delim) {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
