use std::collections::BTreeMap;

use classify::{ClassifiedError, ErrorKind};
use serde_json::Value;

/// Count passenger-type codes.
///
/// `input` must be a sequence of codes, or of objects carrying a string
/// `Code`. The codes are sorted and equal adjacent runs are counted.
pub fn passenger_histogram(input: &Value) -> Result<BTreeMap<String, usize>, ClassifiedError> {
    let Value::Array(items) = input else {
        return Err(invalid("passenger types are not a sequence"));
    };

    let mut codes = items
        .iter()
        .map(|item| match item {
            Value::String(code) => Ok(code.as_str()),
            Value::Object(map) => map
                .get("Code")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid("passenger type has no string Code")),
            _ => Err(invalid("passenger type is neither a code nor an object")),
        })
        .collect::<Result<Vec<&str>, _>>()?;
    codes.sort_unstable();

    let mut counts = BTreeMap::new();
    let mut iter = codes.into_iter().peekable();
    while let Some(code) = iter.next() {
        let mut run = 1;
        while iter.peek() == Some(&code) {
            iter.next();
            run += 1;
        }
        counts.insert(code.to_string(), run);
    }
    Ok(counts)
}

fn invalid(message: &str) -> ClassifiedError {
    ClassifiedError::new(ErrorKind::HistogramTypeInvalid, message)
}
