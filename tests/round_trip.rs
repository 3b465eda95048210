use std::thread;

use reflect_json::parallel::WORKER_STACK_SIZE;
use reflect_json::{
    from_slice, from_str, from_value, parse, reflect_record, to_string, Codec, CodecConfig,
    ErrorKind, PoolSize,
};
use rstest::{fixture, rstest};

#[derive(Debug, Clone, PartialEq)]
struct Tagged {
    id: u32,
    tags: Vec<String>,
}

reflect_record!(Tagged { id: u32, tags: Vec<String> });

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: i32,
    name: String,
    email: String,
}

reflect_record!(User { id: i32, name: String, email: String });

#[derive(Debug, Clone, PartialEq)]
struct Address {
    street: String,
    city: String,
    country: String,
}

reflect_record!(Address { street: String, city: String, country: String });

#[derive(Debug, Clone, PartialEq)]
struct Profile {
    user: User,
    address: Address,
    age: i32,
}

reflect_record!(Profile { user: User, address: Address, age: i32 });

#[derive(Debug, Clone, PartialEq)]
struct Company {
    name: String,
    employees: Vec<Profile>,
}

reflect_record!(Company { name: String, employees: Vec<Profile> });

#[derive(Debug, Clone, PartialEq)]
struct MyData {
    name: String,
    value: i32,
    is_active: bool,
    nested_list: Vec<MyData>,
    sibling: Option<Box<MyData>>,
}

reflect_record!(MyData {
    name: String,
    value: i32,
    is_active: bool,
    nested_list: Vec<MyData>,
    sibling: Option<Box<MyData>>,
});

#[derive(Debug, Clone, PartialEq)]
struct Nothing {}

reflect_record!(Nothing {});

#[derive(Debug, Clone, PartialEq)]
struct Note {
    title: String,
    body: Option<String>,
}

reflect_record!(Note { title: String, body: Option<String> });

#[derive(Debug, Clone, PartialEq)]
struct Numbers {
    small: i8,
    unsigned: u64,
    wide: i64,
    single: f32,
    double: f64,
}

reflect_record!(Numbers { small: i8, unsigned: u64, wide: i64, single: f32, double: f64 });

#[derive(Debug, Clone, PartialEq)]
struct Chain {
    id: u32,
    next: Option<Box<Chain>>,
}

reflect_record!(Chain { id: u32, next: Option<Box<Chain>> });

/// `levels` records, each nested in the previous one's `next`.
fn chain(levels: u32) -> Chain {
    let mut node = Chain { id: levels - 1, next: None };
    for id in (0..levels - 1).rev() {
        node = Chain {
            id,
            next: Some(Box::new(node)),
        };
    }
    node
}

fn company_of(size: i32) -> Company {
    let employees = (0..size)
        .map(|id| Profile {
            user: User {
                id,
                name: format!("User{id}"),
                email: format!("user{id}@example.com"),
            },
            address: Address {
                street: format!("Street {id}"),
                city: format!("City {}", id % 7),
                country: "Country \"quoted\"".to_string(),
            },
            age: 20 + id % 50,
        })
        .collect();
    Company {
        name: "Example company".to_string(),
        employees,
    }
}

#[fixture]
fn codec() -> Codec {
    Codec::new(CodecConfig::new().with_worker_pool_size(PoolSize::threads(4).unwrap())).unwrap()
}

#[rstest]
fn test_documented_example(codec: Codec) {
    let decoded: Tagged = codec.decode(r#"{"id": 7, "tags": ["a","b"]}"#).unwrap();
    assert_eq!(
        decoded,
        Tagged {
            id: 7,
            tags: vec!["a".to_string(), "b".to_string()]
        }
    );
    assert_eq!(codec.encode(&decoded).unwrap(), r#"{"id":7,"tags":["a","b"]}"#);
}

#[rstest]
fn test_empty_shapes(codec: Codec) {
    let empty = Tagged { id: 0, tags: vec![] };
    assert_eq!(codec.encode(&empty).unwrap(), r#"{"id":0,"tags":[]}"#);
    assert_eq!(codec.encode(&Nothing {}).unwrap(), "{}");
    assert_eq!(codec.decode::<Nothing>(r#"{"ignored": [1, 2]}"#).unwrap(), Nothing {});
    assert_eq!(codec.decode::<Vec<Nothing>>("[{},{}]").unwrap().len(), 2);
}

#[rstest]
fn test_optional_fields(codec: Codec) {
    let note = Note {
        title: "t".to_string(),
        body: None,
    };
    assert_eq!(codec.encode(&note).unwrap(), r#"{"title":"t","body":null}"#);
    assert_eq!(codec.decode::<Note>(r#"{"title":"t","body":null}"#).unwrap(), note);
    assert_eq!(codec.decode::<Note>(r#"{"title":"t"}"#).unwrap(), note);

    let err = codec.decode::<Note>(r#"{"title":null}"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    assert_eq!(err.path().to_string(), "$.title");
}

#[rstest]
fn test_company_round_trip(codec: Codec) {
    let company = company_of(250);
    let text = codec.encode(&company).unwrap();
    assert_eq!(codec.decode::<Company>(&text).unwrap(), company);

    // same text as an independent JSON writer would produce for this shape
    let oracle: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(oracle.to_string(), text);
    assert_eq!(oracle["employees"][3]["user"]["name"], "User3");
}

#[rstest]
fn test_recursive_record(codec: Codec) {
    let leaf = |name: &str, value: i32| MyData {
        name: name.to_string(),
        value,
        is_active: value % 2 == 0,
        nested_list: vec![],
        sibling: None,
    };
    let data = MyData {
        name: "root".to_string(),
        value: 1,
        is_active: true,
        nested_list: vec![leaf("a", 2), leaf("b", 3)],
        sibling: Some(Box::new(leaf("s", 4))),
    };
    let text = codec.encode(&data).unwrap();
    assert!(text.starts_with(r#"{"name":"root","value":1,"is_active":true,"nested_list":[{"#));
    assert!(text.ends_with(r#""sibling":{"name":"s","value":4,"is_active":true,"nested_list":[],"sibling":null}}"#));
    assert_eq!(codec.decode::<MyData>(&text).unwrap(), data);
    assert_eq!(from_str::<MyData>(&text).unwrap(), data);
}

#[rstest]
fn test_numbers_round_trip(codec: Codec) {
    let numbers = Numbers {
        small: -128,
        unsigned: u64::MAX,
        wide: i64::MIN,
        single: 0.1,
        double: 1e-7,
    };
    let text = codec.encode(&numbers).unwrap();
    assert_eq!(
        text,
        r#"{"small":-128,"unsigned":18446744073709551615,"wide":-9223372036854775808,"single":0.1,"double":1e-7}"#
    );
    assert_eq!(codec.decode::<Numbers>(&text).unwrap(), numbers);
}

#[rstest]
fn test_whole_floats_drop_trailing_zero() {
    assert_eq!(to_string(&vec![1.0f64, -0.0, 2.5]).unwrap(), "[1,-0,2.5]");
    assert_eq!(from_str::<Vec<f64>>("[1,-0,2.5]").unwrap(), vec![1.0, -0.0, 2.5]);
}

#[rstest]
fn test_string_escapes_round_trip() {
    let texts = vec![
        "quote \" backslash \\ slash /".to_string(),
        "controls \u{1} \u{8} \u{c} \n \r \t \u{1f}".to_string(),
        "unicode é 日本 😀".to_string(),
    ];
    let text = to_string(&texts).unwrap();
    assert_eq!(
        text,
        r#"["quote \" backslash \\ slash /","controls \u0001 \b \f \n \r \t \u001f","unicode é 日本 😀"]"#
    );
    assert_eq!(from_str::<Vec<String>>(&text).unwrap(), texts);
}

#[rstest]
fn test_sequential_and_pooled_agree(codec: Codec) {
    let company = company_of(40);
    assert_eq!(to_string(&company).unwrap(), codec.encode(&company).unwrap());
}

#[rstest]
fn test_decode_from_bytes_and_values(codec: Codec) {
    let text = br#"{"id":1,"tags":["x"]}"#;
    let from_bytes: Tagged = from_slice(text).unwrap();
    let value = parse(std::str::from_utf8(text).unwrap()).unwrap();
    assert_eq!(from_value::<Tagged>(&value).unwrap(), from_bytes);
    assert_eq!(codec.decode_value::<Tagged>(&value).unwrap(), from_bytes);
}

#[rstest]
fn test_invalid_utf8_is_a_parse_error() {
    let bytes = b"[\"ok\", \"\xff\"]";
    match from_slice::<Vec<String>>(bytes).unwrap_err().into_kind() {
        ErrorKind::Parse { location, expected } => {
            assert_eq!(location.offset, 8);
            assert_eq!(expected, "valid UTF-8");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[rstest]
fn test_unknown_keys_and_duplicates(codec: Codec) {
    let decoded: Tagged = codec
        .decode(r#"{"extra":{"deep":[1]},"id":1,"tags":[],"id":2}"#)
        .unwrap();
    assert_eq!(decoded, Tagged { id: 2, tags: vec![] });
}

#[rstest]
#[case(100)]
#[case(127)]
#[case(128)]
fn test_deep_chain_round_trips_on_pool(#[case] levels: u32) {
    let codec = Codec::new(CodecConfig::new().with_worker_pool_size(PoolSize::threads(2).unwrap()))
        .unwrap();
    let data = chain(levels);
    let text = codec.encode(&data).unwrap();
    assert_eq!(text.matches('{').count(), levels as usize);
    assert_eq!(codec.decode::<Chain>(&text).unwrap(), data);
}

#[rstest]
fn test_encoder_and_parser_share_nesting_limit() {
    let codec = Codec::new(CodecConfig::new().with_worker_pool_size(PoolSize::threads(2).unwrap()))
        .unwrap();
    let err = codec.encode(&chain(129)).unwrap_err();
    assert_eq!(err.into_kind(), ErrorKind::DepthLimitExceeded { limit: 128 });

    let text = format!("{}null{}", r#"{"id":0,"next":"#.repeat(129), "}".repeat(129));
    assert!(matches!(
        codec.decode::<Chain>(&text).unwrap_err().kind(),
        ErrorKind::Parse { .. }
    ));
}

#[rstest]
fn test_sequential_walk_enforces_nesting_limit() {
    // the free functions walk on the calling thread
    let outcome = thread::Builder::new()
        .stack_size(WORKER_STACK_SIZE)
        .spawn(|| {
            let text = to_string(&chain(128)).unwrap();
            assert_eq!(from_str::<Chain>(&text).unwrap(), chain(128));
            to_string(&chain(200)).unwrap_err().into_kind()
        })
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(outcome, ErrorKind::DepthLimitExceeded { limit: 128 });
}

#[rstest]
fn test_smaller_configured_depth_applies_to_encoding() {
    let codec = Codec::new(CodecConfig::new().with_max_depth(3)).unwrap();
    assert!(codec.encode(&chain(3)).is_ok());
    let err = codec.encode(&chain(4)).unwrap_err();
    assert_eq!(err.path().to_string(), "$.next.next.next");
    assert_eq!(err.into_kind(), ErrorKind::DepthLimitExceeded { limit: 3 });
}
