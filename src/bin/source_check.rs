use pose_challenge::{BodyPart, GameConfig, PoseSource, ReplayPoseSource};

fn main() {
    let Some(path) = std::env::args().nth(1) else {
        println!("Usage: source_check <recording.json>");
        return;
    };
    println!("Testing pose source {}...\n", path);

    let config = GameConfig::default();
    let mut source = ReplayPoseSource::from_file(&path);

    match source.acquire() {
        Ok(()) => {
            println!("✓ Source acquired ({} frames)", source.frame_count());

            let frames = source.frame_count();
            let mut empty = 0;
            let mut calibratable = 0;
            for _ in 0..frames {
                match source.poll().first() {
                    Some(pose) => {
                        if pose.skeleton(config.skeleton_confidence).shoulder_pair().is_some() {
                            calibratable += 1;
                        }
                    }
                    None => empty += 1,
                }
            }

            if calibratable > 0 {
                println!("✓ Shoulders visible in {}/{} frames - CALIBRATION POSSIBLE", calibratable, frames);
            } else {
                println!("✗ No frame shows both {:?} and {:?}", BodyPart::RightShoulder, BodyPart::LeftShoulder);
            }
            if empty > 0 {
                println!("  {} frame(s) contain no pose", empty);
            }
        }
        Err(e) => {
            println!("✗ Failed to acquire source: {}", e);
            println!("\nPossible causes:");
            println!("1. File does not exist or is not readable");
            println!("2. File is not a JSON array of frames");
            println!("3. Recording has no frames");
        }
    }
}
