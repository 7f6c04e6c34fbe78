use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;

use crate::{
    environment::Env,
    error::ErrorMsg,
    types::{NativeFunc, Value},
};

/// Install the native functions into the global scope.
pub fn init(env: &mut Env) {
    // clock()
    env.define(
        "clock",
        Value::NativeFunc(NativeFunc {
            name: "clock",
            arity: 0,
            body: |_, _| {
                let elapsed = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|_| ErrorMsg::ClockBeforeEpoch)?;
                let millis =
                    i64::try_from(elapsed.as_millis()).map_err(|_| ErrorMsg::NumericOverflow)?;
                // Seconds with millisecond precision
                Ok(Value::Number(Decimal::new(millis, 3)))
            },
        }),
    );
}
