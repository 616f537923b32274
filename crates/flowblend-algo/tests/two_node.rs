//! Smallest networks with hand-computable plans

use flowblend_algo::{PlanConfig, PlanError, Planner, Scenario, SolvePhase};
use flowblend_core::{LocationRole, Network, NetworkBuilder, PeriodId};

/// Freshwater source piped straight into a disposal site.
fn source_to_disposal() -> Network {
    let mut b = NetworkBuilder::new();
    b.periods(["T1"]).modes(["pipeline"]);
    b.location("F01", LocationRole::FreshwaterSource);
    b.location("K01", LocationRole::DisposalSite);
    b.connect("F01", "pipeline", "K01");
    b.transport_capacity("F01", "pipeline", "K01", 100.0);
    b.freshwater_availability("F01", "T1", 100.0);
    b.freshwater_cost("F01", 2.0);
    b.disposal_cost("K01", 1.0);
    b.build().unwrap()
}

/// A customer that must buy freshwater and a pad that must dispose of its
/// production.
fn forced_purchase_and_disposal() -> Network {
    let mut b = NetworkBuilder::new();
    b.periods(["T1"]).modes(["pipeline"]);
    b.location("F01", LocationRole::FreshwaterSource);
    b.location("C01", LocationRole::Customer);
    b.location("PP01", LocationRole::ProductionPad);
    b.location("K01", LocationRole::DisposalSite);
    b.connect("F01", "pipeline", "C01");
    b.connect("PP01", "pipeline", "K01");
    b.transport_capacity("F01", "pipeline", "C01", 100.0);
    b.transport_capacity("PP01", "pipeline", "K01", 100.0);
    b.freshwater_availability("F01", "T1", 100.0);
    b.freshwater_cost("F01", 2.0);
    b.demand("C01", "T1", 100.0);
    b.water_profile("PP01", "T1", 100.0);
    b.disposal_cost("K01", 1.0);
    b.build().unwrap()
}

#[test]
fn nothing_forces_flow_so_the_plan_is_free() {
    let network = source_to_disposal();
    let plan = Planner::default().plan(&network).unwrap();

    assert!(plan.objective().abs() < 1e-5, "objective {}", plan.objective());
    let f01 = network.location_by_name("F01").unwrap();
    assert!(plan.flow.production(f01.id, PeriodId::new(0)) < 1e-5);
}

#[test]
fn forced_purchase_and_disposal_cost_three_hundred() {
    let network = forced_purchase_and_disposal();
    let plan = Planner::default().plan(&network).unwrap();

    assert!(
        (plan.objective() - 300.0).abs() < 1e-4,
        "objective {}",
        plan.objective()
    );
    assert!((plan.flow.costs.total_freshwater - 200.0).abs() < 1e-4);
    assert!((plan.flow.costs.total_disposal - 100.0).abs() < 1e-4);
    assert!(plan.flow.costs.total_transport.abs() < 1e-9);

    let t1 = PeriodId::new(0);
    let f01 = network.location_by_name("F01").unwrap();
    let k01 = network.location_by_name("K01").unwrap();
    assert!((plan.flow.production(f01.id, t1) - 100.0).abs() < 1e-4);
    assert!((plan.flow.demand(k01.id, t1) - 100.0).abs() < 1e-4);
}

#[test]
fn infeasible_demand_stops_before_quality() {
    let mut b = NetworkBuilder::new();
    b.periods(["T1"]).modes(["pipeline"]);
    b.location("F01", LocationRole::FreshwaterSource);
    b.location("C01", LocationRole::Customer);
    b.connect("F01", "pipeline", "C01");
    b.transport_capacity("F01", "pipeline", "C01", 100.0);
    b.freshwater_availability("F01", "T1", 100.0);
    b.demand("C01", "T1", 150.0);
    let network = b.build().unwrap();

    let err = Planner::default().plan(&network).unwrap_err();
    assert!(
        matches!(err, PlanError::InfeasibleFlowModel { .. }),
        "unexpected error: {err}"
    );
    assert_eq!(err.phase(), Some(SolvePhase::Flow));
}

#[test]
fn unconnected_demand_is_reported_with_its_row() {
    let mut b = NetworkBuilder::new();
    b.periods(["T1"]).modes(["pipeline"]);
    b.location("C01", LocationRole::Customer);
    b.demand("C01", "T1", 10.0);
    let network = b.build().unwrap();

    match Planner::default().plan(&network) {
        Err(PlanError::InfeasibleFlowModel { reason }) => {
            assert!(reason.contains("C01"), "reason: {reason}");
        }
        other => panic!("expected infeasible flow model, got {other:?}"),
    }
}

#[test]
fn untouched_storage_rolls_over() {
    let mut b = NetworkBuilder::new();
    b.periods(["T1"]).modes(["pipeline"]);
    b.location("S01", LocationRole::StorageSite);
    b.storage_capacity("S01", 100.0);
    b.storage_init("S01", 20.0);
    b.storage_init_composition("S01", 4000.0);
    let network = b.build().unwrap();

    let plan = Planner::default().plan(&network).unwrap();
    let s01 = network.location_by_name("S01").unwrap();
    let t1 = PeriodId::new(0);
    assert_eq!(plan.flow.storage(s01.id, t1), 20.0);
    assert_eq!(plan.objective(), 0.0);

    let quality = plan.quality.as_ref().unwrap();
    assert!((quality.composition.get(s01.id.value(), t1) - 4000.0).abs() < 1e-2);
}

#[test]
fn batch_keeps_scenario_order_and_isolates_failures() {
    let mut b = NetworkBuilder::new();
    b.periods(["T1"]).modes(["pipeline"]);
    b.location("C01", LocationRole::Customer);
    b.demand("C01", "T1", 10.0);
    let broken = b.build().unwrap();

    let scenarios = vec![
        Scenario {
            name: "free".to_string(),
            network: source_to_disposal(),
        },
        Scenario {
            name: "broken".to_string(),
            network: broken,
        },
        Scenario {
            name: "forced".to_string(),
            network: forced_purchase_and_disposal(),
        },
    ];

    let outcomes = Planner::new(PlanConfig::default()).solve_batch(scenarios);
    let names: Vec<_> = outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["free", "broken", "forced"]);
    assert!(outcomes[0].result.is_ok());
    assert!(outcomes[1].result.is_err());
    let forced = outcomes[2].result.as_ref().unwrap();
    assert!((forced.objective() - 300.0).abs() < 1e-4);
}
