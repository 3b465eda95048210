use std::time::Duration;

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion,
};
use reflect_json::{reflect_record, Codec, CodecConfig, Describe};

#[derive(Clone)]
struct User {
    id: i32,
    name: String,
    email: String,
}

reflect_record!(User { id: i32, name: String, email: String });

#[derive(Clone)]
struct Address {
    street: String,
    city: String,
    country: String,
}

reflect_record!(Address { street: String, city: String, country: String });

#[derive(Clone)]
struct Profile {
    user: User,
    address: Address,
    age: i32,
}

reflect_record!(Profile { user: User, address: Address, age: i32 });

#[derive(Clone)]
struct Company {
    name: String,
    employees: Vec<Profile>,
}

reflect_record!(Company { name: String, employees: Vec<Profile> });

fn make_company(count: i32) -> Company {
    let employees = (0..count)
        .map(|id| Profile {
            user: User {
                id,
                name: format!("User{}", id.wrapping_mul(7919)),
                email: format!("user{}@example.com", id.wrapping_mul(104_729)),
            },
            address: Address {
                street: format!("Street {}", id % 997),
                city: format!("City {}", id % 89),
                country: format!("Country {}", id % 13),
            },
            age: 20 + id % 50,
        })
        .collect();
    Company {
        name: "Example company".to_string(),
        employees,
    }
}

fn bench_encode<T: Describe>(
    group: &mut BenchmarkGroup<'_, WallTime>,
    name: &str,
    value: &T,
    codec: &Codec,
    len: usize,
) {
    group.throughput(criterion::Throughput::Bytes(len as u64));
    group.bench_function(BenchmarkId::new("sequential", name), |b| {
        b.iter(|| {
            let encoded = reflect_json::to_string(black_box(value)).unwrap();
            black_box(encoded);
        });
    });
    group.bench_function(BenchmarkId::new("parallel", name), |b| {
        b.iter(|| {
            let encoded = codec.encode(black_box(value)).unwrap();
            black_box(encoded);
        });
    });
}

fn bench_decode<T: Describe>(
    group: &mut BenchmarkGroup<'_, WallTime>,
    name: &str,
    text: &str,
    codec: &Codec,
) {
    group.throughput(criterion::Throughput::Bytes(text.len() as u64));
    group.bench_function(BenchmarkId::new("sequential", name), |b| {
        b.iter(|| {
            let value: T = reflect_json::from_str(black_box(text)).unwrap();
            black_box(value);
        });
    });
    group.bench_function(BenchmarkId::new("parallel", name), |b| {
        b.iter(|| {
            let value: T = codec.decode(black_box(text)).unwrap();
            black_box(value);
        });
    });
}

fn benches(c: &mut Criterion) {
    let codec = Codec::new(CodecConfig::new()).unwrap();

    let mut encode = c.benchmark_group("encode");
    encode.measurement_time(Duration::from_secs(5));
    let mut decode_inputs = Vec::new();
    for count in [100, 10_000] {
        let company = make_company(count);
        let text = reflect_json::to_string(&company).unwrap();
        bench_encode(&mut encode, &format!("company_{count}"), &company, &codec, text.len());
        decode_inputs.push((count, text));
    }
    encode.finish();

    let mut decode = c.benchmark_group("decode");
    decode.measurement_time(Duration::from_secs(5));
    for (count, text) in &decode_inputs {
        bench_decode::<Company>(&mut decode, &format!("company_{count}"), text, &codec);
    }
    decode.finish();
}

criterion_group!(company, benches);
criterion_main!(company);
