use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use narrowfloat::bench::{bench_operands, bench_params};
use narrowfloat::gemm::*;
use narrowfloat::*;

// Establish a baseline by comparing with a single fpu add

fn baseline_fpu_add_f64(c: &mut Criterion) {
  c.bench_function("baseline_fpu_add_f64", |b| {
    b.iter(|| black_box(3.14) + black_box(69.420));
  });
}

// Time decoding and encoding 1 value

const VALUES: [f64; 4] = [1.0, 0.3, -250.0, 3.0e-3];

fn decode_e4m3(c: &mut Criterion) {
  let mut g = c.benchmark_group("decode_e4m3");
  for bits in [0x38_u8, 0x29, 0xfa, 0x03] {
    g.throughput(Throughput::Elements(1));
    g.bench_with_input(BenchmarkId::from_parameter(format_args!("0b{bits:08b}")), &bits, |b, &bits| {
      b.iter(|| f8e4m3fn::from_bits(black_box(bits)).to_f64());
    });
  }
  g.finish();
}

fn quantize_e4m3(c: &mut Criterion) {
  let mut g = c.benchmark_group("quantize_e4m3");
  for value in VALUES {
    let value = value.abs();
    g.throughput(Throughput::Elements(1));
    g.bench_with_input(BenchmarkId::from_parameter(value), &value, |b, &value| {
      b.iter(|| presets::FLOAT8_E4M3FN.bench_quantize(black_box(value)));
    });
  }
  g.finish();
}

fn encode(c: &mut Criterion) {
  let mut g = c.benchmark_group("encode");
  let mut ctx = RoundingContext::seeded(0);
  let stochastic = FormatDescriptor::builder(8, 4, 3, 7)
    .rounding(RoundingMode::StochasticRounding)
    .validated();
  for value in VALUES {
    g.throughput(Throughput::Elements(1));
    g.bench_with_input(BenchmarkId::new("e4m3fn", value), &value, |b, &value| {
      b.iter(|| presets::FLOAT8_E4M3FN.round_and_encode(black_box(value), &mut ctx));
    });
    g.bench_with_input(BenchmarkId::new("stochastic", value), &value, |b, &value| {
      b.iter(|| stochastic.round_and_encode(black_box(value), &mut ctx));
    });
  }
  g.finish();
}

fn add_e5m2(c: &mut Criterion) {
  let x = f8e5m2::try_from_f64(1.5).unwrap();
  let y = f8e5m2::try_from_f64(-0.375).unwrap();
  c.bench_function("add_e5m2", |b| {
    b.iter(|| black_box(x) + black_box(y));
  });
}

// Time the kernels on small square problems

const SIZES: [usize; 3] = [16, 32, 64];

fn kernels(c: &mut Criterion) {
  let mut g = c.benchmark_group("kernels");
  for n in SIZES {
    let (a, b) = bench_operands(n);
    let a = a.convert::<f8e4m3fn>().unwrap();
    let b = b.convert::<f8e4m3fn>().unwrap();
    let params = bench_params(n).with_accumulator::<f32>();
    g.throughput(Throughput::Elements((n * n * n) as u64));
    for kernel in Kernel::ALL {
      g.bench_with_input(BenchmarkId::new(kernel.to_string(), n), &n, |bench, &n| {
        let mut out = Matrix::<f32>::zeros(n, n);
        bench.iter(|| kernel.run(&a, &b, &mut out, &params).unwrap());
      });
    }
  }
  g.finish();
}

fn squeezing(c: &mut Criterion) {
  let mut g = c.benchmark_group("squeezing");
  for n in SIZES {
    let (a, b) = bench_operands(n);
    let params = bench_params(n);
    g.throughput(Throughput::Elements((n * n * n) as u64));
    g.bench_with_input(BenchmarkId::new("dense", n), &n, |bench, &n| {
      let mut out = Matrix::<f64>::zeros(n, n);
      bench.iter(|| squeezing_matmul::<presets::E4M3Fn, _, _, _, _>(&a, &b, &mut out, &params).unwrap());
    });
    g.bench_with_input(BenchmarkId::new("sparse", n), &n, |bench, &n| {
      let mut out = Matrix::<f64>::zeros(n, n);
      let params = params.with_residual_threshold(1.0);
      bench.iter(|| sparse_squeezing_matmul::<presets::E4M3Fn, _, _, _, _>(&a, &b, &mut out, &params).unwrap());
    });
  }
  g.finish();
}

criterion_group!(baseline_fpu,
  baseline_fpu_add_f64,
);

criterion_group!(scalar,
  decode_e4m3,
  quantize_e4m3,
  encode,
  add_e5m2,
);

criterion_group!(gemm,
  kernels,
  squeezing,
);

criterion_main!(baseline_fpu, scalar, gemm);
