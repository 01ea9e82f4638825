//! Performance benchmarks for hot qkbrew paths
//!
//! Toolchain output classification and ctags parsing run on every chunk and
//! every tagging cycle, so regressions there are felt while typing.

use criterion::{Criterion, criterion_group, criterion_main};
use qkbrew::build::{LineBuffer, classify, render_template};
use qkbrew::config::IdeConfig;
use qkbrew::models::BuildTarget;
use qkbrew::tags::parse_ctags_output;
use std::hint::black_box;
use std::path::Path;

const COMPILER_OUTPUT: &str = "avr-gcc -c -mmcu=atmega328p -Os main.c -o obj/main.o\n\
main.c: In function 'setup':\n\
main.c:12:5: warning: implicit declaration of function 'led_init'\n\
main.c:20:1: error: expected ';' before '}' token\n\
make: *** [obj/main.o] Error 1\n";

/// Benchmark line splitting and classification of toolchain output
fn benchmark_output_classification(c: &mut Criterion) {
    let chunk = COMPILER_OUTPUT.repeat(50);

    c.bench_function("classify_toolchain_output", |b| {
        b.iter(|| {
            let mut buffer = LineBuffer::new();
            let lines = buffer.push(black_box(chunk.as_bytes()));
            let errors = lines
                .iter()
                .filter(|line| classify(line) == qkbrew::models::LineClass::Error)
                .count();
            black_box(errors);
        });
    });
}

/// Benchmark makefile template rendering
fn benchmark_template_rendering(c: &mut Criterion) {
    let config = IdeConfig::default();
    let target = BuildTarget::new(&config, Path::new("/home/user/blink"), "Arduino", "uno");
    let template = "EMB_DIR = {{embDir}}\nTOOLCHAIN_DIR = {{toolchainDir}}\n\
APP_DIR = {{appDir}}\nTARGET = {{target}}\ninclude $(EMB_DIR)/qkprogram/Makefile\n"
        .repeat(10);

    c.bench_function("render_makefile_template", |b| {
        b.iter(|| {
            black_box(render_template(black_box(&template), &target));
        });
    });
}

/// Benchmark ctags output parsing
fn benchmark_ctags_parsing(c: &mut Criterion) {
    let mut output = String::from("!_TAG_FILE_FORMAT\t2\t/extended format/\n");
    for i in 0..500 {
        output.push_str(&format!(
            "func_{i}\t./module_{m}.c\t/^int func_{i}(int value)$/;\"\tfunction\tline:{i}\tsignature:(int value)\n\
PIN_{i}\t./board.h\t/^#define PIN_{i} {i}$/;\"\tmacro\tline:{i}\n",
            m = i % 10
        ));
    }

    c.bench_function("parse_ctags_output", |b| {
        b.iter(|| {
            black_box(parse_ctags_output(black_box(&output)));
        });
    });
}

criterion_group!(
    benches,
    benchmark_output_classification,
    benchmark_template_rendering,
    benchmark_ctags_parsing
);
criterion_main!(benches);
