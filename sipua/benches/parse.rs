use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sipua::parser::parse_message;

fn bench_parse_sip_msg(c: &mut Criterion) {
    let buf = b"INVITE sip:bob@biloxi.example.com SIP/2.0\r\n\
Via: SIP/2.0/TCP client.atlanta.example.com:5060;ttl=65;branch=z9hG4bK74bf9\r\n\
Max-Forwards: 70\r\n\
From: Alice <sip:alice@atlanta.example.com>;tag=9fxced76sl\r\n\
To: Bob <sip:bob@biloxi.example.com>\r\n\
Call-ID: 3848276298220188511@atlanta.example.com\r\n\
CSeq: 2 INVITE\r\n\
Contact: <sip:alice@client.atlanta.example.com;transport=tcp>\r\n\
Content-Type: application/sdp\r\n\
Content-Length: 0\r\n\
User-Agent: X-Lite release 1104o stamp 56125\r\n\
\r\n";

    c.bench_function("parse invite with sdp", |b| {
        b.iter(|| {
            let msg = parse_message(black_box(buf)).unwrap();
            black_box(msg);
        });
    });
}

criterion_group!(benches, bench_parse_sip_msg);
criterion_main!(benches);
