use tiberius::Query;

use crate::types::{Number, TransportValue};

/// Bind positional parameters to a Tiberius query, in order: the first value binds to
/// `@P1`, the second to `@P2`, and so on.
pub fn bind_query_params<'a>(sql: String, params: &[TransportValue]) -> Query<'a> {
    let mut query_builder = Query::new(sql);

    for param in params {
        match param {
            TransportValue::Null => query_builder.bind(Option::<String>::None),
            TransportValue::Boolean(b) => query_builder.bind(*b),
            TransportValue::Number(Number::Int(i)) => query_builder.bind(*i),
            TransportValue::Number(Number::Float(f)) => query_builder.bind(*f),
            TransportValue::String(s) => query_builder.bind(s.clone()),
            TransportValue::Bytes(bytes) => query_builder.bind(bytes.clone()),
        }
    }

    query_builder
}
