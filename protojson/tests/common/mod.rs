//! Message types shared by the integration tests, in both generated and
//! dynamic form.

#![allow(dead_code)]

use std::sync::Arc;

use protojson::schema::Schema;
use protojson::value::{DynamicMessage, Value};
use protojson::{
    GeneratedJson, KeyStrategy, ProtobufJson, ReflectiveJson, proto_enum, proto_message,
};

proto_enum! {
    pub enum Status {
        Pending = 0 as "PENDING",
        Completed = 1 as "COMPLETED",
    }
}

proto_message! {
    pub struct Task {
        pub id(1, "id"): optional int64,
        pub name(2, "name"): optional string,
        pub description(3, "description"): optional string,
        pub status(4, "status"): optional enumeration<Status>,
    }
}

proto_message! {
    pub struct Person {
        pub id(1, "id"): optional int32,
        pub first_name(2, "firstName"): optional string,
        pub last_name(3, "lastName"): optional string,
        pub age(4, "aGe"): optional int32,
        pub email(5, "email"): optional string,
        pub current_task(6, "currentTask"): optional message<Task>,
        pub delegated_task(7, "delegatedTask"): repeated message<Task>,
        pub priority_task(8, "priorityTask"): repeated message<Task>,
        pub repeated_long(9, "repeatedLong"): repeated int64,
    }
}

pub const STRATEGIES: [KeyStrategy; 2] = [KeyStrategy::Named, KeyStrategy::Numeric];

pub fn schema() -> Arc<Schema> {
    match Schema::builder().register::<Person>().build() {
        Ok(schema) => Arc::new(schema),
        Err(e) => panic!("fixture schema: {e}"),
    }
}

pub fn reflective(keys: KeyStrategy) -> ReflectiveJson {
    ReflectiveJson::new(schema(), keys)
}

pub fn generated<M>(keys: KeyStrategy) -> GeneratedJson<M> {
    GeneratedJson::new(keys)
}

pub fn task(id: i64, name: &str, status: Status) -> Task {
    Task {
        id: Some(id),
        name: Some(name.to_owned()),
        description: Some(format!("{name}_description")),
        status: Some(status),
    }
}

pub fn completed_task() -> Task {
    Task {
        id: Some(1),
        name: Some("task_name".into()),
        description: Some("task_description".into()),
        status: Some(Status::Completed),
    }
}

pub fn person() -> Person {
    Person {
        id: Some(42),
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
        age: Some(36),
        email: Some("ada@example.com".into()),
        current_task: Some(completed_task()),
        delegated_task: vec![task(2, "notes", Status::Pending), task(3, "engine", Status::Completed)]
            .into(),
        priority_task: Vec::new().into(),
        repeated_long: vec![1, -2, i64::MAX].into(),
    }
}

/// The dynamic counterpart of [`completed_task`].
pub fn dynamic_task(schema: &Schema) -> DynamicMessage {
    let Some(descriptor) = schema.message("Task") else {
        panic!("Task is registered");
    };
    let mut builder = DynamicMessage::builder(descriptor.clone());
    builder
        .set(1, Value::I64(1))
        .and_then(|b| b.set(2, Value::String("task_name".into())))
        .and_then(|b| b.set(3, Value::String("task_description".into())))
        .and_then(|b| b.set(4, Value::Enum(1)))
        .unwrap();
    builder.build()
}

/// Encodes with `from`, decodes with `to`.
pub fn transcode<A: ProtobufJson, B: ProtobufJson>(
    from: &A,
    to: &B,
    message: &A::Message,
    type_name: &str,
) -> B::Message {
    let json = from.to_string(message).unwrap();
    to.from_str(&json, type_name)
        .unwrap_or_else(|e| panic!("decoding {json}: {e}"))
}
