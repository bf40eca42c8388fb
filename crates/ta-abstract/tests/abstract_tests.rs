//! End-to-end tests of the abstract calling convention.
//!
//! Everything here drives functions through the registry, handles and param
//! holders only, the way a caller with no compile-time knowledge would.

#![allow(clippy::float_cmp)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::{approx_eq, bind_everything, Market, Outputs, EPSILON};
use ta_abstract::meta::{
    FuncFlags, FuncGroup, InputParameterInfo, OptInputValue, OutputFlags, OutputParameterInfo,
};
use ta_abstract::prelude::*;
use ta_abstract::{func_table_free, group_table_free, release};

const LEN: usize = 300;

// ==================== Registry and handles ====================

#[test]
fn test_name_round_trip_for_every_function() {
    let registry = Registry::global();
    let mut seen = 0;
    registry.for_each(|info| {
        let handle = registry.lookup(info.name).unwrap();
        assert_eq!(handle, info.handle);
        assert_eq!(registry.info(handle).unwrap().name, info.name);
        seen += 1;
    });
    assert_eq!(seen, registry.len());
    assert_eq!(seen, ta_abstract::functions::BUILTINS.len());
}

#[test]
fn test_lookup_errors() {
    let registry = Registry::global();
    assert!(matches!(
        registry.lookup(""),
        Err(Error::FunctionNotFound { name }) if name.is_empty()
    ));
    assert!(matches!(
        registry.lookup("9SMA"),
        Err(Error::FunctionNotFound { .. })
    ));
    assert!(matches!(
        registry.lookup("sma"),
        Err(Error::FunctionNotFound { .. })
    ));
    assert!(matches!(
        registry.lookup("SMAX"),
        Err(Error::FunctionNotFound { .. })
    ));
}

#[test]
fn test_foreign_and_forged_handles_rejected() {
    let other = Registry::builder()
        .register_all(ta_abstract::functions::BUILTINS)
        .build();
    let foreign = other.lookup("SMA").unwrap();
    let registry = Registry::global();
    assert_eq!(registry.info(foreign), Err(Error::InvalidHandle));
    assert!(matches!(registry.alloc(foreign), Err(Error::InvalidHandle)));

    let real = registry.lookup("SMA").unwrap();
    let forged = FuncHandle::from_raw(real.index(), real.tag() ^ 1);
    assert_eq!(registry.info(forged), Err(Error::InvalidHandle));
    let past_end = FuncHandle::from_raw(u32::MAX, real.tag());
    assert_eq!(registry.info(past_end), Err(Error::InvalidHandle));
}

#[test]
fn test_groups_partition_the_catalogue() {
    let registry = Registry::global();
    let total: usize = registry
        .groups()
        .iter()
        .map(|g| registry.functions_in_group(g).unwrap().len())
        .sum();
    assert_eq!(total, registry.len());
    assert!(registry
        .functions_in_group("Cycle Indicators")
        .unwrap()
        .is_empty());
    assert!(matches!(
        registry.functions_in_group("Astrology"),
        Err(Error::GroupNotFound { .. })
    ));
}

#[test]
fn test_tables_and_free() {
    let registry = Registry::global();
    let mut groups = registry.group_table().unwrap();
    assert_eq!(groups.len(), 10);
    let mut stats = registry.func_table("Statistic Functions").unwrap();
    assert!(stats.iter().any(|name| name == "CORREL"));

    assert!(matches!(
        func_table_free(Some(&mut groups)),
        Err(Error::InvalidObject { .. })
    ));
    assert_eq!(group_table_free(Some(&mut groups)), Ok(()));
    assert!(matches!(
        group_table_free(Some(&mut groups)),
        Err(Error::InvalidObject { .. })
    ));
    assert_eq!(func_table_free(Some(&mut stats)), Ok(()));
    assert_eq!(func_table_free(None), Ok(()));
    assert_eq!(group_table_free(None), Ok(()));
}

// ==================== Holder lifecycle ====================

#[test]
fn test_fresh_holder_lookback_ok_call_fails() {
    let registry = Registry::global();
    for info in registry.iter() {
        let mut holder = registry.alloc(info.handle).unwrap();
        assert!(holder.lookback().is_ok(), "{}", info.name);
        assert_eq!(
            holder.call(0, LEN - 1),
            Err(Error::InputsNotFullyBound {
                missing: u32::try_from(info.nb_input).unwrap()
            }),
            "{}",
            info.name
        );
    }
}

#[test]
fn test_binding_every_slot_makes_call_succeed() {
    let registry = Registry::global();
    let market = Market::random(7, LEN);
    for info in registry.iter() {
        let mut outputs = Outputs::for_def(registry.resolve(info.handle).unwrap(), LEN);
        let mut holder = registry.alloc(info.handle).unwrap();
        bind_everything(&mut holder, &market, &mut outputs).unwrap();
        assert!(holder.unbound_inputs().is_clear());
        assert!(holder.unbound_outputs().is_clear());

        let lookback = holder.lookback().unwrap();
        let range = holder.call(0, LEN - 1).unwrap();
        assert_eq!(range.beg_idx, lookback, "{}", info.name);
        assert_eq!(range.beg_idx + range.nb_element, LEN, "{}", info.name);
    }
}

#[test]
fn test_outputs_unbound_reported_after_inputs() {
    let registry = Registry::global();
    let data = [1.0, 2.0, 3.0];
    let mut holder = registry.alloc(registry.lookup("BBANDS").unwrap()).unwrap();
    holder.set_input_real(0, &data).unwrap();
    assert_eq!(
        holder.call(0, 2),
        Err(Error::OutputsNotFullyBound { missing: 3 })
    );
}

#[test]
fn test_unset_optional_inputs_equal_explicit_defaults() {
    let registry = Registry::global();
    let market = Market::random(11, LEN);
    for info in registry.iter().filter(|i| i.nb_opt_input > 0) {
        let def = registry.resolve(info.handle).unwrap();

        let mut implicit = Outputs::for_def(def, LEN);
        let mut holder = registry.alloc(info.handle).unwrap();
        bind_everything(&mut holder, &market, &mut implicit).unwrap();
        let implicit_range = holder.call(0, LEN - 1).unwrap();
        drop(holder);

        let mut explicit = Outputs::for_def(def, LEN);
        let mut holder = registry.alloc(info.handle).unwrap();
        bind_everything(&mut holder, &market, &mut explicit).unwrap();
        for (index, opt) in def.opt_inputs.iter().enumerate() {
            match opt.seed_value() {
                OptInputValue::Integer(v) => holder.set_opt_input_integer(index, v).unwrap(),
                OptInputValue::Real(v) => holder.set_opt_input_real(index, v).unwrap(),
            }
        }
        let explicit_range = holder.call(0, LEN - 1).unwrap();
        drop(holder);

        assert_eq!(implicit_range, explicit_range, "{}", info.name);
        assert_eq!(implicit, explicit, "{}", info.name);
    }
}

#[test]
fn test_wrong_kind_binding_keeps_slot_unbound() {
    let registry = Registry::global();
    let market = Market::random(3, 50);

    let mut sma = registry.alloc(registry.lookup("SMA").unwrap()).unwrap();
    assert!(matches!(
        sma.set_input_price(0, market.price()),
        Err(Error::WrongParameterType { index: 0, .. })
    ));
    assert!(matches!(
        sma.set_input_integer(0, &market.counts),
        Err(Error::WrongParameterType { .. })
    ));
    assert!(sma.unbound_inputs().contains(0));
    assert!(matches!(
        sma.set_opt_input_real(0, 3.0),
        Err(Error::WrongParameterType { .. })
    ));
    assert_eq!(sma.opt_input(0), Ok(OptInputValue::Integer(30)));

    let mut trange = registry.alloc(registry.lookup("TRANGE").unwrap()).unwrap();
    assert!(matches!(
        trange.set_input_real(0, &market.close),
        Err(Error::WrongParameterType { .. })
    ));
    assert!(trange.unbound_inputs().contains(0));

    let mut maxindex = registry.alloc(registry.lookup("MAXINDEX").unwrap()).unwrap();
    let mut wrong = vec![0.0; 50];
    assert!(matches!(
        maxindex.set_output_real(0, &mut wrong),
        Err(Error::WrongParameterType { .. })
    ));
    assert!(maxindex.unbound_outputs().contains(0));
}

#[test]
fn test_price_bundle_missing_component_rejected() {
    let registry = Registry::global();
    let market = Market::random(5, 20);
    let mut ad = registry.alloc(registry.lookup("AD").unwrap()).unwrap();
    let no_volume = PriceSeries::hlc(&market.high, &market.low, &market.close);
    assert!(matches!(
        ad.set_input_price(0, no_volume),
        Err(Error::BadParam { .. })
    ));
    assert!(ad.unbound_inputs().contains(0));
    // extra components are accepted
    assert!(ad.set_input_price(0, market.price()).is_ok());
}

#[test]
fn test_out_of_domain_optional_value_checked_on_use() {
    let registry = Registry::global();
    let mut holder = registry.alloc(registry.lookup("SMA").unwrap()).unwrap();
    assert!(matches!(
        holder.set_opt_input_integer(5, 10),
        Err(Error::BadParam { .. })
    ));
    holder.set_opt_input_integer(0, 1).unwrap();
    assert!(matches!(holder.lookback(), Err(Error::BadParam { .. })));
    holder.set_opt_input_integer(0, 2).unwrap();
    assert_eq!(holder.lookback(), Ok(1));

    let mut ma = registry.alloc(registry.lookup("MA").unwrap()).unwrap();
    ma.set_opt_input_integer(1, 42).unwrap();
    assert!(matches!(ma.lookback(), Err(Error::BadParam { .. })));
}

#[test]
fn test_double_release_is_harmless() {
    let registry = Registry::global();
    let data = [1.0, 2.0, 3.0];
    let mut holder = registry.alloc(registry.lookup("SQRT").unwrap()).unwrap();
    holder.set_input_real(0, &data).unwrap();

    holder.release();
    holder.release();
    release(Some(&mut holder));
    release(None);

    assert!(holder.is_released());
    assert_eq!(holder.call(0, 2), Err(Error::InvalidParamHolder));
    assert_eq!(holder.lookback(), Err(Error::InvalidParamHolder));
    assert_eq!(holder.set_input_real(0, &data), Err(Error::InvalidParamHolder));
    assert!(matches!(holder.info(), Err(Error::InvalidParamHolder)));
}

// ==================== Dispatch ====================

#[test]
fn test_correl_identical_series() {
    let registry = Registry::global();
    let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0];
    let mut out = [0.0; 10];
    let mut holder = registry.alloc(registry.lookup("CORREL").unwrap()).unwrap();
    holder.set_input_real(0, &data).unwrap();
    holder.set_input_real(1, &data).unwrap();
    holder.set_opt_input_integer(0, 5).unwrap();
    holder.set_output_real(0, &mut out).unwrap();
    assert_eq!(holder.lookback(), Ok(4));
    let range = holder.call(0, 9).unwrap();
    drop(holder);

    assert_eq!(range, OutputRange::new(4, 6));
    for value in &out[..6] {
        assert!(approx_eq(*value, 1.0, 1e-9), "{value}");
    }
}

#[test]
fn test_correl_constant_series_is_zero() {
    let registry = Registry::global();
    let flat = [2.0; 8];
    let moving = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    let mut out = [9.0; 8];
    let mut holder = registry.alloc(registry.lookup("CORREL").unwrap()).unwrap();
    holder.set_input_real(0, &flat).unwrap();
    holder.set_input_real(1, &moving).unwrap();
    holder.set_opt_input_integer(0, 5).unwrap();
    holder.set_output_real(0, &mut out).unwrap();
    let range = holder.call(0, 7).unwrap();
    drop(holder);
    assert_eq!(range.nb_element, 4);
    assert!(out[..4].iter().all(|&v| v == 0.0));
}

#[test]
fn test_call_sub_range_writes_from_index_zero() {
    let registry = Registry::global();
    let data: Vec<f64> = (1..=20_i32).map(f64::from).collect();
    let mut out = vec![-1.0; 20];
    let mut holder = registry.alloc(registry.lookup("SMA").unwrap()).unwrap();
    holder.set_input_real(0, &data).unwrap();
    holder.set_opt_input_integer(0, 4).unwrap();
    holder.set_output_real(0, &mut out).unwrap();
    let range = holder.call(10, 12).unwrap();
    drop(holder);
    assert_eq!(range, OutputRange::new(10, 3));
    assert!(approx_eq(out[0], 9.5, EPSILON));
    assert!(approx_eq(out[2], 11.5, EPSILON));
    assert_eq!(out[3], -1.0);
}

#[test]
fn test_call_end_beyond_inputs() {
    let registry = Registry::global();
    let short = [1.0, 2.0, 3.0];
    let long = [1.0, 2.0, 3.0, 4.0, 5.0];
    let mut out = [0.0; 5];
    let mut holder = registry.alloc(registry.lookup("ADD").unwrap()).unwrap();
    holder.set_input_real(0, &long).unwrap();
    holder.set_input_real(1, &short).unwrap();
    holder.set_output_real(0, &mut out).unwrap();
    assert_eq!(
        holder.call(0, 4),
        Err(Error::OutOfRangeEndIndex {
            start: 0,
            end: 4,
            available: 3
        })
    );
    assert!(holder.call(0, 2).is_ok());
}

#[test]
fn test_output_buffer_too_small() {
    let registry = Registry::global();
    let data = [1.0, 4.0, 9.0, 16.0];
    let mut out = [0.0; 2];
    let mut holder = registry.alloc(registry.lookup("SQRT").unwrap()).unwrap();
    holder.set_input_real(0, &data).unwrap();
    holder.set_output_real(0, &mut out).unwrap();
    assert!(matches!(
        holder.call(0, 3),
        Err(Error::BufferTooSmall { required: 4, actual: 2, .. })
    ));
}

#[test]
fn test_candlestick_through_holder() {
    let registry = Registry::global();
    let open = [10.0, 10.0];
    let high = [11.0, 12.0];
    let low = [9.0, 8.0];
    let close = [10.05, 11.9];
    let mut out = [0_i32; 2];
    let mut holder = registry.alloc(registry.lookup("CDLDOJI").unwrap()).unwrap();
    assert!(holder.info().unwrap().flags.contains(FuncFlags::CANDLESTICK));
    holder
        .set_input_price(0, PriceSeries::ohlc(&open, &high, &low, &close))
        .unwrap();
    holder.set_output_integer(0, &mut out).unwrap();
    let range = holder.call(0, 1).unwrap();
    drop(holder);
    assert_eq!(range, OutputRange::new(0, 2));
    assert_eq!(out, [100, 0]);
}

// ==================== Custom plugins ====================

static COMPUTE_CALLS: AtomicUsize = AtomicUsize::new(0);

fn zero_lookback(_: &OptInputs<'_>) -> Result<usize> {
    Ok(0)
}

fn counting_compute(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    COMPUTE_CALLS.fetch_add(1, Ordering::SeqCst);
    let data = params.real_input(0)?;
    let out = params.real_output(0)?;
    let values = &data[start_idx..=end_idx];
    out[..values.len()].copy_from_slice(values);
    Ok(OutputRange::new(start_idx, values.len()))
}

static COUNTING: FuncDef = FuncDef {
    name: "COUNTING",
    group: FuncGroup::MathTransform,
    hint: "Copies its input and counts invocations",
    camel_case_name: "Counting",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::real("inReal")],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::real("outReal", OutputFlags::LINE)],
    lookback: zero_lookback,
    compute: counting_compute,
};

fn running_sum(params: &mut CallParams<'_, '_>, start_idx: usize, end_idx: usize) -> Result<OutputRange> {
    let data = params.integer_input(0)?;
    let out = params.integer_output(0)?;
    let mut total = 0_i32;
    for (k, value) in data[start_idx..=end_idx].iter().enumerate() {
        total += value;
        out[k] = total;
    }
    Ok(OutputRange::new(start_idx, end_idx - start_idx + 1))
}

static ISUM: FuncDef = FuncDef {
    name: "ISUM",
    group: FuncGroup::MathOperators,
    hint: "Running sum of an integer series",
    camel_case_name: "ISum",
    flags: FuncFlags::empty(),
    inputs: &[InputParameterInfo::integer("inInteger")],
    opt_inputs: &[],
    outputs: &[OutputParameterInfo::integer("outInteger", OutputFlags::LINE)],
    lookback: zero_lookback,
    compute: running_sum,
};

#[test]
fn test_end_before_start_never_reaches_compute() {
    let registry = Registry::builder().register(&COUNTING).unwrap().build();
    let data = [1.0, 2.0, 3.0, 4.0];
    let mut out = [0.0; 4];
    let mut holder = registry.alloc(registry.lookup("COUNTING").unwrap()).unwrap();
    holder.set_input_real(0, &data).unwrap();
    holder.set_output_real(0, &mut out).unwrap();

    let before = COMPUTE_CALLS.load(Ordering::SeqCst);
    assert!(matches!(
        holder.call(3, 1),
        Err(Error::OutOfRangeEndIndex { start: 3, end: 1, .. })
    ));
    assert_eq!(COMPUTE_CALLS.load(Ordering::SeqCst), before);

    assert_eq!(holder.call(1, 3), Ok(OutputRange::new(1, 3)));
    assert_eq!(COMPUTE_CALLS.load(Ordering::SeqCst), before + 1);
}

#[test]
fn test_integer_input_plugin() {
    let registry = Registry::builder()
        .register(&ISUM)
        .unwrap()
        .register(&COUNTING)
        .unwrap()
        .build();
    assert_eq!(registry.functions_in(FuncGroup::MathOperators).count(), 1);

    let data = [1, 2, 3, 4];
    let mut out = [0_i32; 4];
    let mut holder = registry.alloc(registry.lookup("ISUM").unwrap()).unwrap();
    holder.set_input_integer(0, &data).unwrap();
    holder.set_output_integer(0, &mut out).unwrap();
    let range = holder.call(1, 3).unwrap();
    drop(holder);
    assert_eq!(range, OutputRange::new(1, 3));
    assert_eq!(&out[..3], &[2, 5, 9]);
}

#[test]
fn test_builder_rejects_duplicates() {
    assert!(matches!(
        Registry::builder().register(&COUNTING).unwrap().register(&COUNTING),
        Err(Error::BadParam { .. })
    ));
}
