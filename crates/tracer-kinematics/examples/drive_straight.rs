use tracer_kinematics::trace::TrajectoryStats;
use tracer_kinematics::*;

fn main() {
    let wheel_separation = 0.5;
    let time_step = 0.1;
    let distance = 2.0;
    let speed = 1.0;

    let mut engine = match KinematicEngine::new(wheel_separation, time_step) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to initialize engine: {}", e);
            eprintln!(
                "Please ensure wheel_separation ({}) and time_step ({}) are positive.",
                wheel_separation, time_step
            );
            return;
        }
    };

    println!("Initializing simulation...");
    println!("  {}", engine.geometry());
    println!("  Initial Pose: {}", engine.current_pose());
    println!("  Segment:      {} m at {} m/s", distance, speed);

    match engine.synthesize_straight_line(distance, speed) {
        Ok(profile) => println!("\nApplied {} steps of {}", profile.steps(), profile.pair()),
        Err(e) => {
            eprintln!("Segment rejected: {}", e);
            return;
        }
    }

    for (i, pose) in engine.trajectory().iter().enumerate().skip(1) {
        println!("Step {:>2}: Pose: {}", i, pose);
    }

    let stats = TrajectoryStats::from_poses(engine.trajectory());
    println!("\nSimulation complete.");
    println!("Final Pose: {:?}", engine.current_pose());
    println!("Path length: {:.3} m over {} steps", stats.path_length, stats.steps);
}
