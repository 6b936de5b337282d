use aurora_bytecode::error::Result as ValueResult;
use aurora_bytecode::{Instruction, Opcode, Value, ValueError, ValueKind};
use smol_str::SmolStr;
use static_assertions::assert_eq_size;
use tracing::debug;

use super::frame::Frame;
use super::{Outcome, Vm};
use crate::error::{Result, RuntimeError};
use crate::ops;

assert_eq_size!(Instruction, u64);

/// Executes one instruction. `Some` ends the current unit with that outcome.
pub(crate) type Handler = fn(&mut Vm, &mut Frame<'_>, i32) -> Result<Option<Outcome>>;

/// Handlers indexed by opcode ordinal.
pub(crate) static DISPATCH: [(Opcode, Handler); Opcode::COUNT] = [
    (Opcode::Push, op_push),
    (Opcode::PushI, op_push_i),
    (Opcode::True, op_true),
    (Opcode::False, op_false),
    (Opcode::Pop, op_pop),
    (Opcode::Dup, op_dup),
    (Opcode::Swap, op_swap),
    (Opcode::Add, op_add),
    (Opcode::Sub, op_sub),
    (Opcode::Mul, op_mul),
    (Opcode::Div, op_div),
    (Opcode::Mod, op_mod),
    (Opcode::Neg, op_neg),
    (Opcode::Not, op_not),
    (Opcode::And, op_and),
    (Opcode::Or, op_or),
    (Opcode::Eq, op_eq),
    (Opcode::Neq, op_neq),
    (Opcode::Lt, op_lt),
    (Opcode::Gt, op_gt),
    (Opcode::Lte, op_lte),
    (Opcode::Gte, op_gte),
    (Opcode::Call, op_call),
    (Opcode::Ret, op_ret),
    (Opcode::Res, op_res),
    (Opcode::Load, op_load),
    (Opcode::Store, op_store),
    (Opcode::If, op_if),
    (Opcode::FLoop, op_floop),
    (Opcode::WLoop, op_wloop),
    (Opcode::Break, op_break),
    (Opcode::Continue, op_continue),
    (Opcode::Idx, op_idx),
    (Opcode::SetIdx, op_set_idx),
    (Opcode::List, op_list),
    (Opcode::End, op_end),
];

type Step = Result<Option<Outcome>>;

fn binary(frame: &mut Frame<'_>, f: fn(Value, Value) -> ValueResult<Value>) -> Step {
    let (lhs, rhs) = frame.pop2()?;
    frame.push(f(lhs, rhs)?);
    Ok(None)
}

fn unary(frame: &mut Frame<'_>, f: fn(Value) -> ValueResult<Value>) -> Step {
    let v = frame.pop()?;
    frame.push(f(v)?);
    Ok(None)
}

/// The variable name an instruction refers to.
fn name_operand<'u>(frame: &Frame<'u>, operand: i32) -> Result<&'u SmolStr> {
    match frame.constant(operand)? {
        Value::String(name) => Ok(name),
        _ => Err(RuntimeError::InvalidConstant(operand)),
    }
}

fn count_operand(operand: i32) -> usize {
    operand.max(0) as usize
}

fn op_push(_: &mut Vm, frame: &mut Frame<'_>, operand: i32) -> Step {
    let v = frame.constant(operand)?.clone();
    frame.push(v);
    Ok(None)
}

fn op_push_i(_: &mut Vm, frame: &mut Frame<'_>, operand: i32) -> Step {
    frame.push(Value::Number(operand as f64));
    Ok(None)
}

fn op_true(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    frame.push(Value::Boolean(true));
    Ok(None)
}

fn op_false(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    frame.push(Value::Boolean(false));
    Ok(None)
}

fn op_pop(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    frame.pop()?;
    Ok(None)
}

fn op_dup(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    let v = frame.peek()?.clone();
    frame.push(v);
    Ok(None)
}

fn op_swap(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    let (a, b) = frame.pop2()?;
    frame.push(b);
    frame.push(a);
    Ok(None)
}

fn op_add(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::add)
}

fn op_sub(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::sub)
}

fn op_mul(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::mul)
}

fn op_div(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::div)
}

fn op_mod(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::rem)
}

fn op_neg(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    unary(frame, ops::neg)
}

fn op_not(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    unary(frame, ops::not)
}

fn op_and(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::and)
}

fn op_or(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::or)
}

fn op_eq(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::eq)
}

fn op_neq(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::neq)
}

fn op_lt(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::lt)
}

fn op_gt(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::gt)
}

fn op_lte(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::lte)
}

fn op_gte(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    binary(frame, ops::gte)
}

fn op_call(vm: &mut Vm, frame: &mut Frame<'_>, operand: i32) -> Step {
    let args = frame.pop_n(count_operand(operand))?;
    let callee = frame.pop()?;
    let result = vm.call(&callee, args)?;
    frame.push(result);
    Ok(None)
}

fn op_ret(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    Ok(Some(Outcome::Return(frame.pop()?)))
}

fn op_res(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    Ok(Some(Outcome::Normal(frame.pop()?)))
}

fn op_load(vm: &mut Vm, frame: &mut Frame<'_>, operand: i32) -> Step {
    let name = name_operand(frame, operand)?;
    frame.push(vm.load(name)?);
    Ok(None)
}

fn op_store(vm: &mut Vm, frame: &mut Frame<'_>, operand: i32) -> Step {
    let name = name_operand(frame, operand)?;
    let v = frame.pop()?;
    vm.store(name, v);
    Ok(None)
}

fn op_if(vm: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    let then_unit = frame.pop()?.into_code_unit()?;
    let else_unit = frame.pop()?.into_code_unit()?;
    let cond = frame.pop()?.as_bool()?;

    let chosen = if cond { then_unit } else { else_unit };
    match vm.execute_scoped(&chosen, None)? {
        Outcome::Normal(_) => Ok(None),
        signal => Ok(Some(signal)),
    }
}

fn op_wloop(vm: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    let body = frame.pop()?.into_code_unit()?;
    let cond = frame.pop()?.into_code_unit()?;

    debug!("enter while loop");
    loop {
        let keep_going = match vm.execute(&cond)? {
            Outcome::Normal(v) => v.as_bool()?,
            signal => return Err(RuntimeError::StrayControl(signal.signal_name())),
        };
        if !keep_going {
            break;
        }
        match vm.execute_scoped(&body, None)? {
            Outcome::Normal(_) | Outcome::Continue => {}
            Outcome::Break => break,
            ret @ Outcome::Return(_) => return Ok(Some(ret)),
        }
    }
    debug!("leave while loop");
    Ok(None)
}

fn op_floop(vm: &mut Vm, frame: &mut Frame<'_>, operand: i32) -> Step {
    let name = name_operand(frame, operand)?;
    let body = frame.pop()?.into_code_unit()?;
    let iterable = frame.pop()?;

    let elements: Box<dyn Iterator<Item = Value>> = match &iterable {
        Value::List(list) => Box::new(list.iter().cloned()),
        Value::String(s) => Box::new(
            s.chars()
                .map(|c| Value::String(SmolStr::new(c.encode_utf8(&mut [0; 4]))))
                .collect::<Vec<_>>()
                .into_iter(),
        ),
        other => {
            return Err(ValueError::TypeMismatch {
                expected: ValueKind::List,
                got: other.kind(),
            }
            .into())
        }
    };

    debug!(%name, "enter for loop");
    for element in elements {
        match vm.execute_scoped(&body, Some((name.clone(), element)))? {
            Outcome::Normal(_) | Outcome::Continue => {}
            Outcome::Break => break,
            ret @ Outcome::Return(_) => return Ok(Some(ret)),
        }
    }
    debug!(%name, "leave for loop");
    Ok(None)
}

fn op_break(_: &mut Vm, _: &mut Frame<'_>, _: i32) -> Step {
    Ok(Some(Outcome::Break))
}

fn op_continue(_: &mut Vm, _: &mut Frame<'_>, _: i32) -> Step {
    Ok(Some(Outcome::Continue))
}

fn op_idx(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    let (container, index) = frame.pop2()?;
    frame.push(container.index(&index)?);
    Ok(None)
}

fn op_set_idx(_: &mut Vm, frame: &mut Frame<'_>, _: i32) -> Step {
    let container = frame.pop()?;
    let element = frame.pop()?;
    let index = frame.pop()?;
    frame.push(container.with_index(&index, element)?);
    Ok(None)
}

fn op_list(_: &mut Vm, frame: &mut Frame<'_>, operand: i32) -> Step {
    let items = frame.pop_n(count_operand(operand))?;
    frame.push(Value::list(items));
    Ok(None)
}

fn op_end(_: &mut Vm, _: &mut Frame<'_>, _: i32) -> Step {
    Ok(Some(Outcome::Normal(Value::Nil)))
}

#[cfg(test)]
mod test {
    use aurora_bytecode::Instruction;

    use super::DISPATCH;

    #[test]
    fn dispatch_table_is_in_ordinal_order() {
        for (i, (op, _)) in DISPATCH.iter().enumerate() {
            assert_eq!(Instruction::simple(*op).ordinal(), i, "{} is out of place", op);
        }
    }
}
