//! Blending on small composition values, idle periods and phase budgets

use flowblend_algo::{PlanConfig, PlanError, Planner, QualityBackend, SolvePhase};
use flowblend_core::{LocationRole, Network, NetworkBuilder, PeriodId};

/// Two pads of different water quality draining into one disposal site.
fn two_pads_to_disposal(comp_a: f64, comp_b: f64) -> Network {
    let mut b = NetworkBuilder::new();
    b.periods(["T1"]).modes(["pipeline"]);
    b.location("PP01", LocationRole::ProductionPad);
    b.location("PP02", LocationRole::ProductionPad);
    b.location("K01", LocationRole::DisposalSite);
    for pad in ["PP01", "PP02"] {
        b.connect(pad, "pipeline", "K01");
        b.transport_capacity(pad, "pipeline", "K01", 500.0);
    }
    b.water_profile("PP01", "T1", 100.0);
    b.water_profile("PP02", "T1", 300.0);
    b.production_composition("PP01", "T1", comp_a);
    b.production_composition("PP02", "T1", comp_b);
    b.disposal_cost("K01", 1.0);
    b.build().unwrap()
}

fn config(backend: QualityBackend) -> PlanConfig {
    let mut config = PlanConfig::default();
    config.quality.backend = backend;
    config
}

fn composition(plan: &flowblend_algo::Plan, name: &str, t: usize) -> f64 {
    let loc = plan.network.location_by_name(name).unwrap();
    plan.quality
        .as_ref()
        .unwrap()
        .composition
        .get(loc.id.value(), PeriodId::new(t))
}

#[test]
fn small_compositions_converge_on_both_backends() {
    let cases = [(0.0, 0.0, 0.0), (1.0, 1.0, 1.0), (0.0, 1.0, 0.75), (0.2, 0.6, 0.5)];
    for backend in [QualityBackend::PenaltyLbfgs, QualityBackend::Direct] {
        for (a, b, blend) in cases {
            let network = two_pads_to_disposal(a, b);
            let plan = Planner::new(config(backend))
                .plan(&network)
                .unwrap_or_else(|err| panic!("{backend} with ProdComp {a}/{b}: {err}"));

            let k01 = composition(&plan, "K01", 0);
            assert!(
                (k01 - blend).abs() < 1e-5,
                "{backend} with ProdComp {a}/{b}: K01 composition {k01}"
            );
            assert!((composition(&plan, "PP01", 0) - a).abs() < 1e-5);
            assert!(plan.quality.as_ref().unwrap().mass_residual < 1e-3);
        }
    }
}

#[test]
fn mid_range_compositions_still_converge() {
    let network = two_pads_to_disposal(1_500.0, 2_500.0);
    let plan = Planner::default().plan(&network).unwrap();
    assert!((composition(&plan, "K01", 0) - 2_250.0).abs() < 1e-2);
}

/// PP01 → N01 ⇄ N02 → K01 on zero-distance pipe; PP01 only produces in T1.
fn loop_with_idle_period() -> Network {
    let mut b = NetworkBuilder::new();
    b.periods(["T1", "T2"]).modes(["pipeline"]);
    b.location("PP01", LocationRole::ProductionPad);
    b.location("N01", LocationRole::NetworkNode);
    b.location("N02", LocationRole::NetworkNode);
    b.location("K01", LocationRole::DisposalSite);
    for (o, d) in [("PP01", "N01"), ("N01", "N02"), ("N02", "N01"), ("N02", "K01")] {
        b.connect(o, "pipeline", d);
        b.transport_capacity(o, "pipeline", d, 200.0);
        b.transport_distance(o, "pipeline", d, 0.0);
    }
    b.water_profile("PP01", "T1", 100.0);
    b.water_profile("PP01", "T2", 0.0);
    b.production_composition("PP01", "T1", 70_000.0);
    b.disposal_cost("K01", 1.0);
    b.build().unwrap()
}

#[test]
fn idle_period_moves_no_water() {
    let network = loop_with_idle_period();
    let t2 = PeriodId::new(1);
    for backend in [QualityBackend::PenaltyLbfgs, QualityBackend::Direct] {
        let plan = Planner::new(config(backend)).plan(&network).unwrap();

        for arc in network.arcs() {
            assert_eq!(
                plan.flow.flow(arc, t2),
                0.0,
                "{} carries water in an idle period",
                network.arc_label(arc)
            );
        }
        let back = network
            .arcs()
            .find(|a| {
                network.location(a.origin).name == "N02"
                    && network.location(a.destination).name == "N01"
            })
            .unwrap();
        assert_eq!(plan.flow.flow(back, PeriodId::new(0)), 0.0);

        // Idle nodes keep the blend they last carried.
        for node in ["N01", "N02", "K01"] {
            assert!(
                (composition(&plan, node, 1) - 70_000.0).abs() < 1e-2,
                "{backend}: {node} composition {}",
                composition(&plan, node, 1)
            );
        }
    }
}

#[test]
fn flow_budget_expiry_is_a_timeout() {
    let network = loop_with_idle_period();
    let mut config = PlanConfig::default();
    config.flow.timeout_seconds = 1e-9;

    match Planner::new(config).plan(&network) {
        Err(err @ PlanError::SolverTimeout { .. }) => {
            assert_eq!(err.phase(), Some(SolvePhase::Flow));
        }
        other => panic!("expected flow timeout, got {other:?}"),
    }
}

#[test]
fn quality_budget_expiry_is_a_timeout() {
    let network = loop_with_idle_period();
    let mut config = PlanConfig::default();
    config.quality.timeout_seconds = 1e-9;

    match Planner::new(config).plan(&network) {
        Err(err @ PlanError::SolverTimeout { .. }) => {
            assert_eq!(err.phase(), Some(SolvePhase::Quality));
        }
        other => panic!("expected quality timeout, got {other:?}"),
    }
}
