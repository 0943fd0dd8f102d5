use criterion::{criterion_group, criterion_main};

mod network {
    pub mod application {
        pub mod http {
            pub mod response;
        }
    }
}

criterion_group!(
    benches,
    network::application::http::response::bench_parse_head,
    network::application::http::response::bench_read_block,
    network::application::http::response::bench_post_json
);
criterion_main!(benches);
