use approx::assert_relative_eq;
use genesys_core::model::AsicType;
use genesys_core::motor::{
    calculate_zmod, create_slope_table_for_speed, get_slope_table_max_size, Motor, MotorProfile,
    MotorSlope, StepType,
};

fn lide_slope() -> MotorSlope {
    MotorSlope {
        initial_speed_w: 62464,
        max_speed_w: 2632,
        acceleration: 1.2e-8,
        ..Default::default()
    }
}

fn check_table(target: u32, step_type: StepType, expected: &[u16], expected_sum: u64) {
    let table = create_slope_table_for_speed(&lide_slope(), target, step_type, 4, 8, 1024).unwrap();
    assert_eq!(table.table, expected, "target {target}, step {step_type}");
    assert_eq!(table.pixeltime_sum(), expected_sum);
    assert_eq!(table.len(), expected.len());
}

#[test]
fn test_slope_table_full_step() {
    check_table(
        5000,
        StepType::Full,
        &[62464, 62464, 6420, 5000, 5000, 5000, 5000, 5000],
        156348,
    );
    check_table(
        3000,
        StepType::Full,
        &[62464, 62464, 6420, 4552, 3720, 3223, 3000, 3000],
        148843,
    );
    check_table(
        2000,
        StepType::Full,
        &[62464, 62464, 6420, 4552, 3720, 3223, 2883, 2632],
        148358,
    );
}

#[test]
fn test_slope_table_half_step() {
    check_table(
        5000,
        StepType::Half,
        &[31232, 31232, 3210, 2500, 2500, 2500, 2500, 2500],
        78174,
    );
    check_table(
        3000,
        StepType::Half,
        &[31232, 31232, 3210, 2276, 1860, 1611, 1500, 1500],
        74421,
    );
}

#[test]
fn test_slope_table_clamps_to_max_speed() {
    let table = create_slope_table_for_speed(&lide_slope(), 1000, StepType::Full, 4, 8, 1024).unwrap();
    assert_eq!(table.table.last(), Some(&2632));
}

#[test]
fn test_slope_table_respects_max_size() {
    let table = create_slope_table_for_speed(&lide_slope(), 5000, StepType::Full, 4, 8, 4).unwrap();
    assert_eq!(table.table, vec![62464, 62464, 6420, 5000]);
}

#[test]
fn test_slope_table_rejects_slow_target() {
    assert!(create_slope_table_for_speed(&lide_slope(), 70000, StepType::Full, 4, 8, 1024).is_err());
}

#[test]
fn test_slope_table_max_size_per_asic() {
    assert_eq!(get_slope_table_max_size(AsicType::Gl842).unwrap(), 255);
    assert_eq!(get_slope_table_max_size(AsicType::Gl646).unwrap(), 255);
    assert_eq!(get_slope_table_max_size(AsicType::Gl847).unwrap(), 1024);
    assert_eq!(get_slope_table_max_size(AsicType::Gl124).unwrap(), 1024);
    assert!(get_slope_table_max_size(AsicType::Unknown).is_err());
}

#[test]
fn test_create_from_steps_reaches_max_speed() {
    let slope = MotorSlope::create_from_steps(10000, 2000, 100);
    // (1/2000^2 - 1/10000^2) / 200
    assert_relative_eq!(slope.acceleration, 1.2e-9, max_relative = 1e-4);
    assert_eq!(slope.get_table_step_shifted(0, StepType::Full), 10000);
    assert_eq!(slope.get_table_step_shifted(1, StepType::Half), 5000);

    let last = slope.get_table_step_shifted(101, StepType::Full);
    assert!((1998..=2001).contains(&last), "got {last}");
}

#[test]
fn test_step_type_round_trip() {
    for step in [StepType::Full, StepType::Half, StepType::Quarter, StepType::Eighth] {
        assert_eq!(StepType::from_shift(step.shift()).unwrap(), step);
    }
    assert_eq!(StepType::Eighth.to_string(), "1/8");
}

#[test]
fn test_zmod() {
    let table = [10, 8, 6, 6];
    assert_eq!(calculate_zmod(false, 7, &table, 3, 2, 1).unwrap(), (2, 1));
    assert_eq!(calculate_zmod(true, 7, &table, 3, 2, 1).unwrap(), (2, 2));
    assert!(calculate_zmod(false, 0, &table, 3, 2, 1).is_err());
    assert!(calculate_zmod(false, 7, &table, 5, 2, 1).is_err());
}

#[test]
fn test_zmod_uses_last_acceleration_step() {
    // Only the first three steps accelerate; the tail of the table must not
    // leak into either correction.
    let table = [100, 90, 80, 70, 60, 50];
    assert_eq!(calculate_zmod(false, 100000, &table, 3, 1, 3).unwrap(), (510, 350));
    assert_eq!(calculate_zmod(false, 100000, &table, 3, 4, 0).unwrap(), (270, 590));
    assert_eq!(calculate_zmod(true, 100000, &table, 3, 4, 0).unwrap(), (270, 350));
}

#[test]
fn test_motor_profile_lookup() {
    let motor = Motor {
        id: "test".into(),
        base_ydpi: 1200,
        profiles: vec![
            MotorProfile::new(lide_slope(), StepType::Half, 0),
            MotorProfile::new(MotorSlope::create_from_steps(4000, 1000, 64), StepType::Quarter, 0),
        ],
        fast_profiles: Vec::new(),
    };

    assert_eq!(motor.max_step_type(), StepType::Quarter);
    assert_eq!(
        motor.get_slope_with_step_type(StepType::Half).unwrap().initial_speed_w,
        62464
    );
    assert!(motor.get_slope_with_step_type(StepType::Eighth).is_err());
}
