use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ratecal_core::Handle;
use ratecal_instruments::{IborConvention, SwaptionArguments, SwaptionEngine};
use ratecal_models::{G2Model, HullWhite};
use ratecal_pricingengines::{
    FdHullWhiteSwaptionEngine, G2SwaptionEngine, JamshidianSwaptionEngine,
};
use ratecal_termstructures::{FlatForward, YieldTermStructure};
use ratecal_time::{Actual360, Actual365Fixed, Date, Period};
use std::hint::black_box;
use std::sync::Arc;

fn curve() -> Handle<dyn YieldTermStructure> {
    let reference = Date::from_ymd(2016, 2, 17).expect("valid date");
    Handle::from_arc(
        Arc::new(FlatForward::continuous(reference, 0.06215, Actual365Fixed))
            as Arc<dyn YieldTermStructure>,
    )
}

fn swaption(ts: &Handle<dyn YieldTermStructure>, maturity: i32, length: i32) -> SwaptionArguments {
    let index = IborConvention::euribor_6m();
    SwaptionArguments::atm(
        ts.try_get().expect("curve"),
        &index,
        Period::years(maturity),
        Period::years(length),
        index.tenor(),
        &Actual360,
    )
    .expect("swaption arguments")
}

fn bench_engines(c: &mut Criterion) {
    let ts = curve();
    let args = swaption(&ts, 5, 5);
    let hw = Arc::new(HullWhite::new(ts.clone()).expect("model"));
    let engines: Vec<Box<dyn SwaptionEngine>> = vec![
        Box::new(G2SwaptionEngine::with_defaults(Arc::new(
            G2Model::new(ts.clone()).expect("model"),
        ))),
        Box::new(JamshidianSwaptionEngine::new(hw.clone())),
        Box::new(FdHullWhiteSwaptionEngine::with_defaults(hw)),
    ];

    let mut group = c.benchmark_group("swaption_5x5");
    for engine in &engines {
        group.bench_with_input(BenchmarkId::from_parameter(engine.name()), &args, |b, args| {
            b.iter(|| black_box(engine.calculate(black_box(args)).expect("price")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_engines);
criterion_main!(benches);
