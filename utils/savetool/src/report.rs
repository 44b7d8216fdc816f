use colored::*;
use engine::Engine;
use state::SaveMetadata;
use types::SegmentKind;
use vm::KernelDispatcher;

pub fn print_metadata(metadata: &SaveMetadata, magic: &[u8]) {
    println!("{}", "Save header".bold().blue());
    println!("  magic:        {}", hex::encode(magic));
    println!("  revision:     {}", metadata.revision);
    println!("  name:         {}", metadata.name.yellow());
    println!("  game:         {}", metadata.game_id);
    println!("  content:      {}", metadata.content_version);
    println!("  interpreter:  {}", metadata.interpreter_version);
    println!("  saved at:     {} (unix seconds)", metadata.timestamp);
    println!("  play time:    {}", format_play_time(metadata.play_time));
}

/// Ticks as `h:mm:ss`.
pub fn format_play_time(ticks: u32) -> String {
    let seconds = ticks / engine::Config::TICKS_PER_SECOND;
    format!("{}:{:02}:{:02}", seconds / 3600, seconds / 60 % 60, seconds % 60)
}

pub fn print_heap(engine: &Engine, hex_dumps: bool) {
    let state = engine.state();
    println!();
    println!("{}", "Segments".bold().blue());
    print!("{}", engine.describe_heap());

    println!();
    println!("{}", "Resident scripts".bold().blue());
    let mut any = false;
    for (number, segment) in state.scripts.loaded() {
        any = true;
        println!(
            "  script {:>4}  segment {}  lockers {}",
            number.to_string().yellow(),
            segment,
            state.lockers(number)
        );
    }
    if !any {
        println!("  {}", "none".dimmed());
    }

    if hex_dumps {
        for (id, segment) in state.heap.iter() {
            if !matches!(segment.kind(), SegmentKind::Script | SegmentKind::Dynmem) {
                continue;
            }
            if let Some(dump) = state.heap.dump(id) {
                println!();
                println!("{} {}", "Segment".bold(), id.to_string().cyan());
                print!("{}", dump);
            }
        }
    }
}

pub fn print_kernel(kernel: &KernelDispatcher) {
    println!(
        "{} {} on {}",
        "Kernel table for".bold().blue(),
        kernel.version().to_string().yellow(),
        kernel.platform().to_string().yellow()
    );
    print!("{}", kernel.describe());
}

#[cfg(test)]
mod tests {
    use super::format_play_time;

    #[test]
    fn test_play_time_formatting() {
        assert_eq!(format_play_time(0), "0:00:00");
        assert_eq!(format_play_time(60 * 61), "0:01:01");
        assert_eq!(format_play_time(60 * 3600 * 2 + 59), "2:00:00");
    }
}
