use skiproot_canonical::{encode, hash_value, Value};

fn main() {
    let values = [
        ("integer", Value::Integer(1999)),
        ("text", Value::Text("skiproot".into())),
        ("raw", Value::raw(&[0xde, 0xad, 0xbe, 0xef])),
        ("null", Value::Null),
    ];

    for (name, value) in &values {
        println!(
            "{:<8} {:<40} {}",
            name,
            hex::encode(encode(value)),
            hash_value(value)
        );
    }
}
