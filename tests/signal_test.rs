//! Light phase state machine and green-time sizing

use std::rc::Rc;

use assert_approx_eq::assert_approx_eq;
use junction_sim::simulation::{
    clearance_ratio, AdaptiveGreenTime, DensityScaledGreenTime, GreenTimeContext,
    GreenTimeStrategy, JunctionId, LightState, LinearGreenTime, PerformanceHistory, Side,
    SignalPhase, TimingConfig,
};

fn phase_with(strategy: Rc<dyn GreenTimeStrategy>, timing: TimingConfig) -> SignalPhase {
    SignalPhase::new(JunctionId(0), Side::North, timing, strategy)
}

fn adaptive_phase() -> SignalPhase {
    phase_with(Rc::new(AdaptiveGreenTime::default()), TimingConfig::default())
}

#[test]
fn test_green_time_always_within_bounds() {
    let timing = TimingConfig {
        min_green: 10.0,
        max_green: 30.0,
        ..TimingConfig::default()
    };
    let strategies: Vec<Rc<dyn GreenTimeStrategy>> = vec![
        Rc::new(AdaptiveGreenTime::default()),
        Rc::new(DensityScaledGreenTime),
        Rc::new(LinearGreenTime::default()),
    ];

    for strategy in strategies {
        for history_ratio in [None, Some(0.0), Some(0.8), Some(1.0)] {
            let mut phase = phase_with(strategy.clone(), timing);
            if let Some(ratio) = history_ratio {
                for _ in 0..5 {
                    phase.record_performance((ratio * 10.0) as usize, 10);
                }
            }
            for side in [Side::North, Side::East] {
                for count in 0..30 {
                    for approaching in [0, 1, 4, 15] {
                        for step in 0..=10 {
                            let mut context = GreenTimeContext::new(side, count)
                                .with_approaching(approaching)
                                .with_density(step as f32 / 10.0);
                            for inter_junction in [false, true] {
                                if inter_junction {
                                    context = context.inter_junction();
                                }
                                let green = phase.calculate_green_time(&context);
                                assert!(
                                    (timing.min_green..=timing.max_green).contains(&green),
                                    "{strategy:?} gave {green}s for {context:?}"
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_adaptive_green_components() {
    let phase = adaptive_phase();
    // No history yet counts as perfect clearance, which shortens green by 3
    assert_approx_eq!(phase.average_performance(), 1.0);
    assert_approx_eq!(
        phase.calculate_green_time(&GreenTimeContext::new(Side::North, 2)),
        13.0
    );
    // Density bonus is capped at 20
    assert_approx_eq!(
        phase.calculate_green_time(&GreenTimeContext::new(Side::North, 10)),
        27.0
    );
    // Approach bonus only counts on the East-West axis
    let approaching = GreenTimeContext::new(Side::East, 2).with_approaching(3);
    assert_approx_eq!(phase.calculate_green_time(&approaching), 19.0);
    assert_approx_eq!(
        phase.calculate_green_time(&approaching.for_side(Side::South)),
        13.0
    );
    // Empty queue falls back to the minimum
    assert_approx_eq!(
        phase.calculate_green_time(&GreenTimeContext::new(Side::North, 0)),
        10.0
    );
}

#[test]
fn test_poor_clearance_extends_and_good_clearance_shortens_green() {
    let timing = TimingConfig::default();
    let strategy = AdaptiveGreenTime::default();
    let context = GreenTimeContext::new(Side::East, 3).with_approaching(2);

    // Baseline with an average in the neutral band
    let mut neutral = PerformanceHistory::new(timing.history_len);
    neutral.push(0.8);
    let baseline = timing.clamp_green(strategy.green_time(&context, &neutral, &timing));

    let mut poor = adaptive_phase();
    for _ in 0..3 {
        poor.record_performance(5, 10);
    }
    assert!(poor.calculate_green_time(&context) >= baseline);
    assert_approx_eq!(poor.calculate_green_time(&context), baseline + 5.0);

    let mut good = adaptive_phase();
    for _ in 0..3 {
        good.record_performance(10, 10);
    }
    assert!(good.calculate_green_time(&context) <= baseline);
    assert_approx_eq!(good.calculate_green_time(&context), baseline - 3.0);
}

#[test]
fn test_density_scaled_and_linear_sizing() {
    let timing = TimingConfig {
        max_green: 30.0,
        ..TimingConfig::default()
    };
    let density = phase_with(Rc::new(DensityScaledGreenTime), timing);
    let half = GreenTimeContext::new(Side::West, 4).with_density(0.5);
    assert_approx_eq!(density.calculate_green_time(&half), 20.0);
    assert_approx_eq!(
        density.calculate_green_time(&half.with_density(1.0)),
        30.0
    );

    let linear = phase_with(Rc::new(LinearGreenTime::default()), TimingConfig::default());
    let local = GreenTimeContext::new(Side::North, 3);
    assert_approx_eq!(linear.calculate_green_time(&local), 16.0);
    assert_approx_eq!(linear.calculate_green_time(&local.inter_junction()), 24.0);
    assert_approx_eq!(
        linear.calculate_green_time(&GreenTimeContext::new(Side::North, 20)),
        45.0
    );
}

#[test]
fn test_full_cycle_red_green_yellow_red() {
    let mut phase = adaptive_phase();
    assert_eq!(phase.state(), LightState::Red);
    assert!(!phase.countdown_active());

    let duration = phase.start_cycle(&GreenTimeContext::new(Side::North, 2));
    assert_approx_eq!(duration, 13.0);
    assert_eq!(phase.state(), LightState::Green);
    assert!(phase.countdown_active());
    assert_approx_eq!(phase.timer(), 13.0);

    for _ in 0..12 {
        phase.tick(1.0, true, 2, false);
        assert_eq!(phase.state(), LightState::Green);
    }
    phase.tick(1.0, true, 2, false);
    assert_eq!(phase.state(), LightState::Yellow);
    assert_approx_eq!(phase.timer(), 3.0);

    phase.tick(1.0, true, 2, false);
    phase.tick(1.0, true, 2, false);
    assert_eq!(phase.state(), LightState::Yellow);
    phase.tick(1.0, true, 2, false);
    assert_eq!(phase.state(), LightState::Red);
    assert!(!phase.countdown_active());
    assert_approx_eq!(phase.timer(), 0.0);

    // Nothing left during green, so the cycle scored zero
    let ratios: Vec<f32> = phase.performance_history().ratios().collect();
    assert_eq!(ratios, vec![0.0]);
}

#[test]
fn test_cleared_count_tracks_vehicles_leaving_during_green() {
    let mut phase = adaptive_phase();
    phase.start_cycle(&GreenTimeContext::new(Side::North, 4));

    phase.tick(1.0, true, 3, false);
    phase.tick(1.0, true, 1, false);
    // A new arrival does not undo what already cleared
    phase.tick(1.0, true, 2, false);
    phase.force_red();

    let ratios: Vec<f32> = phase.performance_history().ratios().collect();
    assert_eq!(ratios.len(), 1);
    assert_approx_eq!(ratios[0], 0.75);
}

#[test]
fn test_no_vehicles_forces_red() {
    let mut phase = adaptive_phase();
    phase.start_cycle(&GreenTimeContext::new(Side::North, 2));
    phase.tick(1.0 / 60.0, false, 0, false);

    assert_eq!(phase.state(), LightState::Red);
    assert!(!phase.countdown_active());
    assert_eq!(phase.performance_history().len(), 1);
}

#[test]
fn test_incident_forces_green_to_red() {
    let mut phase = adaptive_phase();
    phase.start_cycle(&GreenTimeContext::new(Side::North, 2));
    phase.tick(1.0 / 60.0, true, 2, true);

    assert_eq!(phase.state(), LightState::Red);
    assert!(!phase.countdown_active());
}

#[test]
fn test_reset_skips_performance_record() {
    let mut phase = adaptive_phase();
    phase.start_cycle(&GreenTimeContext::new(Side::North, 2));
    phase.reset();

    assert_eq!(phase.state(), LightState::Red);
    assert!(phase.performance_history().is_empty());
}

#[test]
fn test_performance_history_is_bounded() {
    let mut phase = adaptive_phase();
    for cleared in 1..=7 {
        phase.record_performance(cleared, 10);
    }
    // Cycles that started empty carry no information
    phase.record_performance(0, 0);

    let ratios: Vec<f32> = phase.performance_history().ratios().collect();
    assert_eq!(ratios.len(), 5);
    assert_approx_eq!(ratios[0], 0.3);
    assert_approx_eq!(ratios[4], 0.7);
    assert_approx_eq!(phase.average_performance(), 0.5);
}

#[test]
fn test_clearance_ratio_of_empty_cycle_is_zero() {
    assert_approx_eq!(clearance_ratio(0, 0), 0.0);
    assert_approx_eq!(clearance_ratio(3, 4), 0.75);
}
