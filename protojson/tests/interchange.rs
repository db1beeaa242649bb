//! Every key strategy and dispatch strategy reads what the others write.

mod common;

use common::*;
use protojson::schema::Schema;
use protojson::value::Value;
use protojson::{GeneratedJson, KeyStrategy, ProtobufJson, ReflectiveJson, proto_message};
use protojson_testhelpers::test;

#[test]
fn task_named() {
    let codec = GeneratedJson::<Task>::named();
    let json = codec.to_string(&completed_task()).unwrap();
    assert_eq!(
        json,
        r#"{"id":1,"name":"task_name","description":"task_description","status":"COMPLETED"}"#
    );
    assert_eq!(codec.from_str(&json, "Task").unwrap(), completed_task());
}

#[test]
fn task_numeric() {
    let codec = GeneratedJson::<Task>::numeric();
    let json = codec.to_string(&completed_task()).unwrap();
    assert_eq!(
        json,
        r#"{"1":1,"2":"task_name","3":"task_description","4":1}"#
    );
    assert_eq!(codec.from_str(&json, "Task").unwrap(), completed_task());

    // numeric keys still take the enum by symbol
    let symbolic = r#"{"1":1,"2":"task_name","3":"task_description","4":"COMPLETED"}"#;
    assert_eq!(codec.from_str(symbolic, "Task").unwrap(), completed_task());
}

#[test]
fn reflective_matches_generated_bytes() {
    let schema = schema();
    let dynamic = dynamic_task(&schema);
    for keys in STRATEGIES {
        let reflective = ReflectiveJson::new(schema.clone(), keys);
        let generated = GeneratedJson::<Task>::new(keys);
        assert_eq!(
            reflective.to_string(&dynamic).unwrap(),
            generated.to_string(&completed_task()).unwrap(),
            "{keys:?}"
        );
    }
}

#[test]
fn round_trip_every_combination() {
    let schema = schema();
    for keys in STRATEGIES {
        let generated = generated::<Person>(keys);
        let reflective = ReflectiveJson::new(schema.clone(), keys);

        // generated -> generated
        assert_eq!(transcode(&generated, &generated, &person(), "Person"), person());

        // generated -> reflective -> reflective -> generated
        let dynamic = transcode(&generated, &reflective, &person(), "Person");
        let dynamic_again = transcode(&reflective, &reflective, &dynamic, "Person");
        assert_eq!(dynamic_again, dynamic);
        assert_eq!(transcode(&reflective, &generated, &dynamic, "Person"), person());
    }
}

#[test]
fn nested_and_repeated_counts() {
    let schema = schema();
    for keys in STRATEGIES {
        let reflective = ReflectiveJson::new(schema.clone(), keys);
        let dynamic = transcode(&generated::<Person>(keys), &reflective, &person(), "Person");

        let Some(Value::Message(current)) = dynamic.single(6) else {
            panic!("currentTask should be a nested message: {dynamic:?}");
        };
        assert_eq!(current, &dynamic_task(&schema));

        assert_eq!(dynamic.repeated_len(7), 2);
        let names: Vec<_> = dynamic
            .repeated(7)
            .iter()
            .filter_map(Value::as_message)
            .filter_map(|task| task.single(2)?.as_str())
            .collect();
        assert_eq!(names, ["notes", "engine"]);

        assert_eq!(
            dynamic.repeated(9),
            [Value::I64(1), Value::I64(-2), Value::I64(i64::MAX)]
        );

        // set but empty
        assert!(dynamic.has(8));
        assert_eq!(dynamic.repeated_len(8), 0);
    }
}

#[test]
fn absent_fields_are_not_written() {
    let sparse = Person {
        id: Some(7),
        ..Person::default()
    };
    assert_eq!(
        GeneratedJson::<Person>::named().to_string(&sparse).unwrap(),
        r#"{"id":7}"#
    );

    let schema = schema();
    for keys in STRATEGIES {
        let reflective = ReflectiveJson::new(schema.clone(), keys);
        let dynamic = transcode(&generated::<Person>(keys), &reflective, &sparse, "Person");
        assert!(dynamic.has(1));
        for tag in 2..=9 {
            assert!(!dynamic.has(tag), "field {tag} should be absent under {keys:?}");
        }
        assert_eq!(transcode(&reflective, &generated::<Person>(keys), &dynamic, "Person"), sparse);
    }
}

#[test]
fn empty_repeated_stays_present() {
    let schema = schema();
    let reflective = ReflectiveJson::numeric(schema.clone());
    let dynamic = reflective.from_str(r#"{"1":7,"9":[]}"#, "Person").unwrap();
    assert!(dynamic.has(9));
    assert!(!dynamic.has(7));
    assert_eq!(dynamic.repeated_len(9), 0);
    assert_eq!(reflective.to_string(&dynamic).unwrap(), r#"{"1":7,"9":[]}"#);

    // present-empty and absent compare equal
    let absent = reflective.from_str(r#"{"1":7}"#, "Person").unwrap();
    assert_eq!(dynamic, absent);

    let generated = GeneratedJson::<Person>::numeric();
    let person = generated.from_str(r#"{"1":7,"9":[]}"#, "Person").unwrap();
    assert!(person.repeated_long.is_empty());
    assert!(person.repeated_long.is_present());
    assert!(!person.delegated_task.is_present());
    assert_eq!(generated.to_string(&person).unwrap(), r#"{"1":7,"9":[]}"#);
    assert_eq!(transcode(&generated, &reflective, &person, "Person"), dynamic);

    let absent = generated.from_str(r#"{"1":7}"#, "Person").unwrap();
    assert_eq!(person, absent);
    assert_eq!(generated.to_string(&absent).unwrap(), r#"{"1":7}"#);
}

proto_message! {
    struct Gauge {
        reading(1, "reading"): optional double,
        ratio(2, "ratio"): optional float,
        history(3, "history"): repeated double,
    }
}

#[test]
fn nan_survives_a_round_trip() {
    let gauge = Gauge {
        reading: Some(f64::NAN),
        ratio: Some(f32::NAN),
        history: vec![1.5, f64::NAN, f64::NEG_INFINITY].into(),
    };
    let schema = match Schema::builder().register::<Gauge>().build() {
        Ok(schema) => std::sync::Arc::new(schema),
        Err(e) => panic!("{e}"),
    };
    for keys in STRATEGIES {
        let generated = generated::<Gauge>(keys);
        let reflective = ReflectiveJson::new(schema.clone(), keys);

        assert_eq!(transcode(&generated, &generated, &gauge, "Gauge"), gauge);

        let dynamic = transcode(&generated, &reflective, &gauge, "Gauge");
        assert_eq!(dynamic.single(1), Some(&Value::F64(f64::NAN)));
        assert_eq!(transcode(&reflective, &reflective, &dynamic, "Gauge"), dynamic);
        assert_eq!(transcode(&reflective, &generated, &dynamic, "Gauge"), gauge);
    }
}

#[test]
fn unknown_fields_are_ignored() {
    let with_extra = r#"{
        "id": 1,
        "unknownScalar": 12,
        "name": "task_name",
        "unknownObject": {"a": [1, {"b": null}], "c": "}"},
        "description": "task_description",
        "unknownArray": [[], {}, "x"],
        "status": "COMPLETED"
    }"#;
    let without = r#"{"id":1,"name":"task_name","description":"task_description","status":"COMPLETED"}"#;

    let generated = GeneratedJson::<Task>::named();
    assert_eq!(
        generated.from_str(with_extra, "Task").unwrap(),
        generated.from_str(without, "Task").unwrap()
    );

    let reflective = ReflectiveJson::named(schema());
    assert_eq!(
        reflective.from_str(with_extra, "Task").unwrap(),
        reflective.from_str(without, "Task").unwrap()
    );
}

#[test]
fn names_under_numeric_keys_are_unknown() {
    // each strategy only recognizes its own keys
    let task = GeneratedJson::<Task>::numeric()
        .from_str(r#"{"id":1,"2":"x"}"#, "Task")
        .unwrap();
    assert_eq!(task.id, None);
    assert_eq!(task.name.as_deref(), Some("x"));

    let task = GeneratedJson::<Task>::named()
        .from_str(r#"{"1":1,"name":"x"}"#, "Task")
        .unwrap();
    assert_eq!(task.id, None);
    assert_eq!(task.name.as_deref(), Some("x"));
}

#[test]
fn json_names_are_case_sensitive() {
    let person = GeneratedJson::<Person>::named()
        .from_str(r#"{"aGe":36,"age":99,"AGE":98}"#, "Person")
        .unwrap();
    assert_eq!(person.age, Some(36));
}

#[test]
fn sequences() {
    let tasks = vec![completed_task(), task(2, "second", Status::Pending)];
    let schema = schema();
    for keys in STRATEGIES {
        let generated = generated::<Task>(keys);
        let reflective = ReflectiveJson::new(schema.clone(), keys);

        let json = generated.many_to_string(&tasks, "Task").unwrap();
        assert!(json.starts_with("[{") && json.ends_with("}]"));

        let mut dynamic = Vec::new();
        let mut input = protojson::JsonReader::new(json.as_bytes());
        assert_eq!(reflective.append_many(&mut input, &mut dynamic, "Task").unwrap(), 2);
        input.finish().unwrap();
        assert_eq!(dynamic.len(), 2);
        assert_eq!(dynamic[0], dynamic_task(&schema));

        let json_again = reflective.many_to_string(&dynamic, "Task").unwrap();
        assert_eq!(json_again, json);

        // appending keeps what the caller already had
        let mut out = vec![task(0, "existing", Status::Pending)];
        let mut input = protojson::JsonReader::new(json_again.as_bytes());
        generated.append_many(&mut input, &mut out, "Task").unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].name.as_deref(), Some("existing"));
        assert_eq!(out[1..], tasks[..]);
    }
}

#[test]
fn empty_sequence() {
    for keys in STRATEGIES {
        let generated = generated::<Task>(keys);
        assert_eq!(generated.many_to_string(&[], "Task").unwrap(), "[]");
        assert!(generated.many_from_str(" [ ] ", "Task").unwrap().is_empty());
    }
}

#[test]
fn pretty_output() {
    let codec = GeneratedJson::<Person>::named();
    let person = Person {
        id: Some(1),
        current_task: Some(Task {
            id: Some(5),
            status: Some(Status::Pending),
            ..Task::default()
        }),
        repeated_long: vec![1, 2].into(),
        ..Person::default()
    };
    let pretty = codec.to_string_pretty(&person).unwrap();
    insta::assert_snapshot!(pretty, @r#"
    {
      "id": 1,
      "currentTask": {
        "id": 5,
        "status": "PENDING"
      },
      "repeatedLong": [
        1,
        2
      ]
    }
    "#);
    assert_eq!(codec.from_str(&pretty, "Person").unwrap(), person);
}

#[test]
fn key_strategy_is_reported() {
    assert_eq!(ReflectiveJson::numeric(schema()).key_strategy(), KeyStrategy::Numeric);
    assert_eq!(GeneratedJson::<Task>::named().key_strategy(), KeyStrategy::Named);
}
