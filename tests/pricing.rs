mod common;

use common::{assert_rel_close, black_scholes, european_call, init_logging, zero_coupon_bond};
use pecunia_core::compute::kernel;
use pecunia_core::lattice::scenarios::sweep_volatility;
use pecunia_core::lattice::BinomialTree;
use pecunia_core::{
    compile_evolution, compile_evolution_with, present_value, ContractGraph, LatticeParams, Operand, PricingError,
    Realization, Series,
};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
fn test_zero_coupon_bond(
    #[values(Realization::Interpreted, Realization::Precompiled)] realization: Realization,
    #[values(0.0, 0.1, 0.2, 0.3, 0.4)] volatility: f64,
) {
    init_logging();
    let (graph, root) = zero_coupon_bond(1.0);
    let evolution = compile_evolution_with(&graph, root, realization).unwrap();

    let pv = present_value(&evolution, &LatticeParams::new(1.0, 1.0, 0.02, volatility)).unwrap();
    assert_rel_close(pv, 1.0, 1e-10);
}

#[rstest]
fn test_zero_coupon_bond_at_tiny_volatility(
    #[values(Realization::Interpreted, Realization::Precompiled)] realization: Realization,
    #[values(0.0005, 1e-300)] volatility: f64,
) {
    let (graph, root) = zero_coupon_bond(1.0);
    let evolution = compile_evolution_with(&graph, root, realization).unwrap();

    let pv = present_value(&evolution, &LatticeParams::new(1.0, 1.0, 0.02, volatility)).unwrap();
    assert_rel_close(pv, 1.0, 1e-9);
}

#[rstest]
fn test_european_call_matches_black_scholes(
    #[values(Realization::Interpreted, Realization::Precompiled)] realization: Realization,
    #[values(0.0, 0.1, 0.2, 0.3, 0.4)] volatility: f64,
) {
    let (graph, root) = european_call(1.0, 1.0);
    let evolution = compile_evolution_with(&graph, root, realization).unwrap();

    let pv = present_value(&evolution, &LatticeParams::new(1.0, 1.0, 0.02, volatility)).unwrap();
    assert_rel_close(pv, black_scholes(1.0, 1.0, 1.0, 0.02, volatility), 1e-3);
}

#[rstest]
#[case(0.8)]
#[case(1.25)]
fn test_off_the_money_calls(#[case] strike: f64) {
    let (graph, root) = european_call(0.5, strike);
    let evolution = compile_evolution(&graph, root).unwrap();

    let pv = present_value(&evolution, &LatticeParams::new(0.5, 1.0, 0.03, 0.25)).unwrap();
    assert_rel_close(pv, black_scholes(0.5, strike, 1.0, 0.03, 0.25), 1e-2);
}

#[test]
fn test_call_is_monotone_in_volatility() {
    let (graph, root) = european_call(1.0, 1.0);
    let evolution = compile_evolution(&graph, root).unwrap();

    let base = LatticeParams::new(1.0, 1.0, 0.02, 0.0).with_steps(400);
    let vols: Vec<f64> = (0..=10).map(|i| i as f64 * 0.05).collect();
    let values: Vec<f64> = sweep_volatility(&evolution, &base, &vols)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    for w in values.windows(2) {
        assert!(w[1] >= w[0], "values not monotone: {:?}", values);
    }
}

#[test]
fn test_convergence_improves_with_steps() {
    let (graph, root) = european_call(1.0, 1.0);
    let evolution = compile_evolution(&graph, root).unwrap();
    let exact = black_scholes(1.0, 1.0, 1.0, 0.02, 0.3);

    let err = |steps: usize| {
        let pv = present_value(&evolution, &LatticeParams::new(1.0, 1.0, 0.02, 0.3).with_steps(steps)).unwrap();
        (pv - exact).abs()
    };
    assert!(err(1000) < err(10));
}

/// Drives both realizations with identical frames and compares every yield bitwise.
#[test]
fn test_realizations_are_bitwise_identical() {
    let mut graph = ContractGraph::new();
    let late = graph.anchor(1.0).unwrap();
    let mid = graph.anchor(0.5).unwrap();
    let late_call = graph.sum([Operand::Node(late), Operand::Constant(-1.05)]).unwrap();
    let mid_call = graph.sum([Operand::Node(mid), Operand::Constant(-1.0)]).unwrap();
    let shared = graph.max([Operand::Node(mid_call), Operand::Constant(0.0)]).unwrap();
    let root = graph.max([late_call, shared, shared]).unwrap();

    let interpreted = compile_evolution_with(&graph, root, Realization::Interpreted).unwrap();
    let precompiled = compile_evolution_with(&graph, root, Realization::Precompiled).unwrap();
    let mut a = interpreted.procedure();
    let mut b = precompiled.procedure();

    let tree = BinomialTree::new(&LatticeParams::new(1.0, 1.0, 0.02, 0.3).with_steps(64)).unwrap();
    let mut x: Series = Arc::new(tree.terminal_prices());
    let zeros: Series = Arc::new(vec![0.0; x.len()]);

    let va = a.prime(1.0, Arc::clone(&x), Arc::clone(&zeros)).unwrap();
    let vb = b.prime(1.0, Arc::clone(&x), zeros).unwrap();
    assert_bitwise(&va, &vb);
    let mut v = va;

    for level in 1..=tree.steps {
        let time = tree.level_time(level);
        let prices: Series = Arc::new(kernel::retreat(&x, tree.retreat));
        let values: Series = Arc::new(kernel::rollback(&v, tree.p, tree.q, tree.discount));
        let va = a.resume(time, Arc::clone(&prices), Arc::clone(&values)).unwrap();
        let vb = b.resume(time, Arc::clone(&prices), values).unwrap();
        assert_bitwise(&va, &vb);
        v = va;
        x = prices;
    }
    assert!(a.is_done() && b.is_done());
}

fn assert_bitwise(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
}

#[rstest]
fn test_procedure_is_single_use(#[values(Realization::Interpreted, Realization::Precompiled)] realization: Realization) {
    let (graph, root) = european_call(1.0, 1.0);
    let evolution = compile_evolution_with(&graph, root, realization).unwrap();
    let mut procedure = evolution.procedure();

    let one: Series = Arc::new(vec![1.0]);
    procedure.prime(1.0, Arc::clone(&one), Arc::clone(&one)).unwrap();
    procedure.resume(0.0, Arc::clone(&one), Arc::clone(&one)).unwrap();
    assert!(procedure.is_done());

    for _ in 0..2 {
        assert_eq!(
            procedure.resume(0.0, Arc::clone(&one), Arc::clone(&one)),
            Err(PricingError::ProcedureExhausted)
        );
    }
}

#[test]
fn test_evolution_is_reusable_across_valuations() {
    let (graph, root) = european_call(1.0, 1.0);
    let evolution = compile_evolution(&graph, root).unwrap();
    let params = LatticeParams::new(1.0, 1.0, 0.02, 0.3).with_steps(100);

    let first = present_value(&evolution, &params).unwrap();
    let second = present_value(&evolution, &params).unwrap();
    assert_eq!(first.to_bits(), second.to_bits());
}

#[test]
fn test_shared_subexpression_counts_per_occurrence() {
    // Sum(call, call) over one shared call node is worth two calls.
    let (mut graph, call) = european_call(1.0, 1.0);
    let doubled = graph.sum([call, call]).unwrap();
    let params = LatticeParams::new(1.0, 1.0, 0.02, 0.3).with_steps(200);

    let single = present_value(&compile_evolution(&graph, call).unwrap(), &params).unwrap();
    let double = present_value(&compile_evolution(&graph, doubled).unwrap(), &params).unwrap();
    assert_rel_close(double, 2.0 * single, 1e-12);
}

#[test]
fn test_early_exercise_dominates_each_leg() {
    // Max(At(1) - K, At(0.5) - K, 0): choose at t = 0.5 between exercising
    // and holding the t = 1 forward.
    let strike = 1.0;
    let mut graph = ContractGraph::new();
    let late = graph.anchor(1.0).unwrap();
    let early = graph.anchor(0.5).unwrap();
    let late_payoff = graph.sum([Operand::Node(late), Operand::Constant(-strike)]).unwrap();
    let early_payoff = graph.sum([Operand::Node(early), Operand::Constant(-strike)]).unwrap();
    let root = graph
        .max([Operand::Node(late_payoff), Operand::Node(early_payoff), Operand::Constant(0.0)])
        .unwrap();
    let params = LatticeParams::new(1.0, 1.0, 0.02, 0.3).with_steps(500);

    let pv = present_value(&compile_evolution(&graph, root).unwrap(), &params).unwrap();
    let forward = 1.0 - strike * (-0.02f64).exp();
    let early_call = black_scholes(0.5, strike, 1.0, 0.02, 0.3);
    assert!(pv >= forward, "pv={} forward={}", pv, forward);
    assert!(pv >= early_call * (1.0 - 1e-3), "pv={} early_call={}", pv, early_call);
}

#[test]
fn test_anchor_at_present_is_spot() {
    let (graph, root) = zero_coupon_bond(0.0);
    let evolution = compile_evolution(&graph, root).unwrap();
    let pv = present_value(&evolution, &LatticeParams::new(1.0, 1.7, 0.02, 0.3).with_steps(50)).unwrap();
    assert_rel_close(pv, 1.7, 1e-12);
}

#[test]
fn test_undefined_time_surfaces_at_compile() {
    let mut graph = ContractGraph::new();
    let orphan = graph.max([1.0, 0.0]).unwrap();
    assert_eq!(
        compile_evolution(&graph, orphan).unwrap_err(),
        PricingError::UndefinedTime { node: orphan }
    );
}

#[test]
fn test_json_round_trip_prices_identically() {
    let (graph, root) = european_call(1.0, 1.1);
    let restored = ContractGraph::from_json(&graph.to_json().unwrap()).unwrap();
    let params = LatticeParams::new(1.0, 1.0, 0.02, 0.3).with_steps(100);

    let before = present_value(&compile_evolution(&graph, root).unwrap(), &params).unwrap();
    let after = present_value(&compile_evolution(&restored, root).unwrap(), &params).unwrap();
    assert_eq!(before.to_bits(), after.to_bits());
}

#[test]
fn test_schedule_covers_every_reachable_node() {
    let mut graph = ContractGraph::new();
    let a = graph.anchor(0.75).unwrap();
    let b = graph.anchor(0.25).unwrap();
    let c = graph.anchor(0.75).unwrap();
    let spread = graph.sum([Operand::Node(a), Operand::Constant(-1.0)]).unwrap();
    let floor = graph.max([Operand::Node(b), Operand::Node(spread)]).unwrap();
    let root = graph.sum([floor, c]).unwrap();

    let schedule = pecunia_core::build_schedule(&graph, root).unwrap();
    let times: Vec<f64> = schedule.times().collect();
    assert_eq!(times, vec![0.75, 0.25, 0.0]);
    for node in [a, b, c, spread, floor, root] {
        let time = graph.resolution_time(node).unwrap();
        assert!(schedule.get(time).unwrap().nodes.contains(&node));
    }
}
