use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tn3270::datastream::codes::*;
use tn3270::datastream::parse_message;
use tn3270::ebcdic;
use tn3270::screen::addressing::{encode_address, AddressMode};
use tn3270::screen::ScreenBuffer;

fn bench_ebcdic_round_trip(c: &mut Criterion) {
    let text = "THE QUICK BROWN FOX JUMPS OVER THE LAZY DOG 0123456789";
    c.bench_function("ebcdic_encode_decode_round_trip", |b| {
        b.iter(|| {
            let bytes = ebcdic::encode(black_box(text));
            black_box(ebcdic::decode(&bytes))
        })
    });
}

fn bench_address_encode(c: &mut Criterion) {
    c.bench_function("address_encode_12bit", |b| {
        b.iter(|| black_box(encode_address(black_box(1234), AddressMode::TwelveBit)))
    });
}

fn bench_parse_erase_write_screen(c: &mut Criterion) {
    let mut data = vec![CMD_ERASE_WRITE, WCC_RESET];
    for row in 0..24u16 {
        let addr = row * 80;
        let (b0, b1) = encode_address(addr, AddressMode::TwelveBit);
        data.extend_from_slice(&[ORDER_SBA, b0, b1, ORDER_SF, ATTR_PROTECTED]);
        data.extend(std::iter::repeat(0xC1).take(78));
    }

    c.bench_function("parse_full_screen_erase_write", |b| {
        b.iter(|| black_box(parse_message(black_box(&data), AddressMode::TwelveBit)))
    });
}

fn bench_screen_buffer_write(c: &mut Criterion) {
    c.bench_function("screen_buffer_fill_model2", |b| {
        b.iter(|| {
            let mut screen = ScreenBuffer::new();
            for _ in 0..screen.buffer_size() {
                screen.write_char(0xC1).unwrap();
            }
            black_box(&screen);
        })
    });
}

criterion_group!(
    benches,
    bench_ebcdic_round_trip,
    bench_address_encode,
    bench_parse_erase_write_screen,
    bench_screen_buffer_write
);
criterion_main!(benches);
