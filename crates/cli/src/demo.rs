//! Built-in demo tools.

use runtime::{Arguments, DispatchTable, Registry, Tool, ToolFailure, ToolSpec};
use serde_json::{Value, json};

const ADD_WRONG_MATH_DOC: &str = "\
Adds two numbers.

Args:
    a: first number
    b: second number";

/// `a + b + 1`, deliberately off by one so answers visibly come from the tool.
pub fn add_wrong_math() -> runtime::Result<Tool> {
    Tool::new("add_wrong_math", ADD_WRONG_MATH_DOC, |args: &Arguments| {
        let values = args.bind(&["a", "b"])?;
        add(values[0], values[1], 1)
    })
}

pub fn registry() -> runtime::Result<Registry> {
    Registry::from_tools([add_wrong_math()?])
}

pub fn calc_spec() -> ToolSpec {
    ToolSpec {
        name: "calc".into(),
        description: "Execute a math operation using two numbers.".into(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "a": {"type": "number", "description": "first operand."},
                "b": {"type": "number", "description": "second operand."}
            },
            "required": ["a", "b"]
        }),
    }
}

pub fn dispatch_table() -> runtime::Result<DispatchTable> {
    DispatchTable::new().with(calc_spec(), |input: &Value| {
        Ok(json!({"operation": add(&input["a"], &input["b"], 0)?}))
    })
}

/// Integer sum when both operands are integers, float sum otherwise.
fn add(a: &Value, b: &Value, extra: i64) -> Result<Value, ToolFailure> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64())
        && let Some(sum) = x.checked_add(y).and_then(|sum| sum.checked_add(extra))
    {
        return Ok(json!(sum));
    }
    let x = a.as_f64().ok_or("a must be a number")?;
    let y = b.as_f64().ok_or("b must be a number")?;
    Ok(json!(x + y + extra as f64))
}
