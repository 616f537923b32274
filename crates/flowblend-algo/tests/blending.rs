//! Plan properties on a multi-period network with storage, two modes and a
//! recycling loop through a storage site.

use flowblend_algo::{compute_flow_violations, PlanConfig, Planner, QualityBackend, SolverStatus};
use flowblend_core::{LocationRole, Network, NetworkBuilder, PeriodId};

fn sample_network() -> Network {
    let mut b = NetworkBuilder::new();
    b.periods(["T1", "T2", "T3"]).modes(["pipeline", "truck"]);

    b.location("PP01", LocationRole::ProductionPad);
    b.location("PP02", LocationRole::ProductionPad);
    b.location("CP01", LocationRole::CompletionsPad);
    b.location("F01", LocationRole::FreshwaterSource);
    b.location("K01", LocationRole::DisposalSite);
    b.location("S01", LocationRole::StorageSite);
    b.location("N01", LocationRole::NetworkNode);

    let arcs = [
        ("PP01", "pipeline", "N01", 100.0, 0.01, 10.0),
        ("PP02", "pipeline", "N01", 100.0, 0.01, 5.0),
        ("PP02", "truck", "CP01", 20.0, 0.05, 20.0),
        ("N01", "pipeline", "CP01", 150.0, 0.01, 8.0),
        ("N01", "pipeline", "K01", 150.0, 0.02, 12.0),
        ("N01", "pipeline", "S01", 80.0, 0.005, 4.0),
        ("S01", "pipeline", "N01", 80.0, 0.005, 4.0),
        ("F01", "truck", "CP01", 100.0, 0.08, 15.0),
    ];
    for (o, m, d, cap, cost, dist) in arcs {
        b.connect(o, m, d);
        b.transport_capacity(o, m, d, cap);
        b.transport_cost(o, m, d, cost);
        b.transport_distance(o, m, d, dist);
    }

    let profiles = [("T1", 40.0, 30.0), ("T2", 60.0, 30.0), ("T3", 20.0, 30.0)];
    for (t, pp01, pp02) in profiles {
        b.water_profile("PP01", t, pp01);
        b.water_profile("PP02", t, pp02);
        b.production_composition("PP02", t, 80_000.0);
        b.freshwater_availability("F01", t, 100.0);
    }
    b.production_composition("PP01", "T1", 120_000.0);
    b.production_composition("PP01", "T2", 110_000.0);
    b.production_composition("PP01", "T3", 100_000.0);
    b.demand("CP01", "T1", 50.0);
    b.demand("CP01", "T2", 70.0);
    b.demand("CP01", "T3", 40.0);

    b.storage_capacity("PP01", 30.0);
    b.storage_init("PP01", 10.0);
    b.storage_init_composition("PP01", 90_000.0);
    b.storage_capacity("CP01", 40.0);
    b.storage_capacity("S01", 200.0);
    b.storage_init("S01", 50.0);
    b.storage_init_composition("S01", 50_000.0);

    b.freshwater_cost("F01", 3.0);
    b.disposal_cost("K01", 1.5);
    b.build().unwrap()
}

fn config_with(backend: QualityBackend) -> PlanConfig {
    let mut config = PlanConfig::default();
    config.quality.backend = backend;
    config
}

#[test]
fn flow_plan_respects_every_constraint() {
    let network = sample_network();
    let plan = Planner::default().plan(&network).unwrap();

    let violations = compute_flow_violations(&network, &plan.flow);
    assert!(violations.max_balance_residual < 1e-5, "{violations:?}");
    assert!(violations.max_arc_capacity_excess < 1e-5, "{violations:?}");
    assert!(violations.max_storage_capacity_excess < 1e-5, "{violations:?}");
    assert!(violations.max_availability_excess < 1e-5, "{violations:?}");
    assert!(violations.max_negativity < 1e-9, "{violations:?}");
    assert_eq!(plan.violations, {
        let mut v = violations.clone();
        v.max_composition_residual = plan.violations.max_composition_residual;
        v
    });
}

#[test]
fn known_quantities_and_storage_cycles_are_exact() {
    let network = sample_network();
    let plan = Planner::default().plan(&network).unwrap();
    let periods = network.periods();
    let last = periods.last();

    for loc in network.locations() {
        for t in periods.iter() {
            let i = t.value();
            if !loc.role.has_free_production() {
                assert_eq!(plan.flow.production(loc.id, t), loc.params.water_profile[i]);
            }
            if !loc.role.has_free_demand() {
                assert_eq!(plan.flow.demand(loc.id, t), loc.params.demand[i]);
            }
        }
        if loc.role.requires_storage_cycle() {
            assert_eq!(plan.flow.storage(loc.id, last), loc.params.storage_init);
        }
    }
    assert_eq!(plan.violations.max_cycle_mismatch, 0.0);
    assert_eq!(plan.violations.max_fixed_deviation, 0.0);
}

#[test]
fn objective_matches_recomputed_costs() {
    let network = sample_network();
    let plan = Planner::default().plan(&network).unwrap();
    let costs = &plan.flow.costs;

    assert_eq!(plan.flow.status, SolverStatus::Optimal);
    assert!((plan.objective() - costs.total()).abs() < 1e-9);
    // 160 of completions demand against 210 of pad water: at most 50 needs disposal
    assert!(costs.total_disposal <= 1.5 * 50.0 + 1e-4);
    assert!(costs.total_freshwater < 1e-4, "freshwater bought: {costs:?}");
}

#[test]
fn repeated_plans_agree() {
    let network = sample_network();
    let planner = Planner::default();
    let first = planner.plan(&network).unwrap();
    let second = planner.plan(&network).unwrap();

    let scale = 1.0 + first.objective().abs();
    assert!((first.objective() - second.objective()).abs() <= 1e-6 * scale);
}

#[test]
fn composition_satisfies_mass_balance() {
    let network = sample_network();
    for backend in [QualityBackend::PenaltyLbfgs, QualityBackend::Direct] {
        let plan = Planner::new(config_with(backend)).plan(&network).unwrap();
        let quality = plan.quality.as_ref().unwrap();
        assert_eq!(quality.status, SolverStatus::Converged);
        // mass terms are volume × concentration, up to ~1.2e7 here
        assert!(
            quality.mass_residual < 1e-4 * 1.2e7,
            "{backend}: mass residual {}",
            quality.mass_residual
        );
        assert_eq!(
            plan.violations.max_composition_residual,
            Some(quality.mass_residual)
        );
    }
}

#[test]
fn compositions_stay_within_input_range() {
    let network = sample_network();
    let plan = Planner::new(config_with(QualityBackend::Direct))
        .plan(&network)
        .unwrap();
    let quality = plan.quality.unwrap();

    for loc in network.locations() {
        for t in network.periods().iter() {
            let c = quality.composition.get(loc.id.value(), t);
            assert!(
                (-1e-3..=120_000.0 + 1e-3).contains(&c),
                "{} {t:?}: {c}",
                loc.name
            );
        }
    }

    // PP02 never stores and receives nothing, so it carries its own water
    let pp02 = network.location_by_name("PP02").unwrap();
    let c = quality.composition.get(pp02.id.value(), PeriodId::new(1));
    assert!((c - 80_000.0).abs() < 1e-3, "PP02 composition {c}");
}

#[test]
fn quality_backends_agree() {
    let network = sample_network();
    let lbfgs = Planner::new(config_with(QualityBackend::PenaltyLbfgs))
        .plan(&network)
        .unwrap();
    let direct = Planner::new(config_with(QualityBackend::Direct))
        .plan(&network)
        .unwrap();

    let a = &lbfgs.quality.as_ref().unwrap().composition;
    let b = &direct.quality.as_ref().unwrap().composition;
    for loc in network.locations() {
        for t in network.periods().iter() {
            let (x, y) = (a.get(loc.id.value(), t), b.get(loc.id.value(), t));
            assert!(
                (x - y).abs() <= 1e-3 * (1.0 + y.abs()),
                "{} {t:?}: lbfgs {x} vs direct {y}",
                loc.name
            );
        }
    }
}

#[test]
fn disabled_tracking_skips_quality() {
    let network = sample_network();
    let mut config = PlanConfig::default();
    config.plan.track_composition = false;
    let plan = Planner::new(config).plan(&network).unwrap();

    assert!(plan.quality.is_none());
    assert_eq!(plan.violations.max_composition_residual, None);
    let report = plan.report();
    assert!(report.composition.is_empty());
    assert_eq!(report.transfers.len(), network.arc_count() * 3);
    assert_eq!(report.storage.len(), network.location_count() * 3);
}

#[test]
fn report_rows_follow_network_order() {
    let network = sample_network();
    let plan = Planner::default().plan(&network).unwrap();
    let report = plan.report();

    let first = &report.transfers[0];
    assert_eq!(
        (first.origin.as_str(), first.mode.as_str(), first.destination.as_str()),
        ("PP01", "pipeline", "N01")
    );
    assert_eq!(first.period, "T1");
    assert_eq!(report.composition.len(), network.location_count() * 3);
    assert!((report.summary.objective - plan.objective()).abs() < 1e-12);
    assert_eq!(report.summary.flow_backend, "Clarabel");

    let json = serde_json::to_value(&report.summary).unwrap();
    assert!(json.get("quality_iterations").is_some());
}

#[cfg(feature = "solver-highs")]
#[test]
fn highs_and_clarabel_reach_the_same_cost() {
    use flowblend_algo::LpBackend;

    let network = sample_network();
    let clarabel = Planner::default().plan(&network).unwrap();
    let mut config = PlanConfig::default();
    config.flow.backend = LpBackend::Highs;
    let highs = Planner::new(config).plan(&network).unwrap();

    let scale = 1.0 + clarabel.objective().abs();
    assert!((clarabel.objective() - highs.objective()).abs() <= 1e-5 * scale);
}
