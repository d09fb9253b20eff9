// src/cli/progress.rs — Terminal progress renderer for real-time run feedback

use crate::core::types::ProgressEvent;

/// Render one progress event as a single line. `label` distinguishes
/// concurrent runs ("q1", "q2", ...).
pub fn format_event(label: &str, event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::PlanReady => format!("[{label} plan] initial plan ready"),
        ProgressEvent::IterationStart {
            iteration,
            max_iterations,
        } => format!("[{label} iter {iteration}/{max_iterations}] executing..."),
        ProgressEvent::Reflected {
            iteration,
            score,
            threshold,
        } => format!("[{label} iter {iteration}] completeness={score:.2} (threshold {threshold:.2})"),
        ProgressEvent::PlanRevised { iteration } => {
            format!("[{label} iter {iteration}] plan revised")
        }
        ProgressEvent::DeadlineReached { iterations } => {
            format!("[{label} deadline] stopping after {iterations} iteration(s)")
        }
        ProgressEvent::Synthesizing => format!("[{label} synth] synthesizing final answer..."),
        ProgressEvent::Complete {
            iterations,
            final_score,
            termination,
        } => format!(
            "[{label} done] completeness={final_score:.2} iterations={iterations} ({termination})"
        ),
    }
}

/// Build a progress callback that writes formatted lines to stderr.
///
/// All progress output goes to stderr so stdout remains clean for results.
pub fn terminal_progress(label: String) -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event| eprintln!("{}", format_event(&label, &event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Termination;

    #[test]
    fn test_plan_ready_format() {
        assert_eq!(
            format_event("q1", &ProgressEvent::PlanReady),
            "[q1 plan] initial plan ready"
        );
    }

    #[test]
    fn test_iteration_start_format() {
        let msg = format_event(
            "q1",
            &ProgressEvent::IterationStart {
                iteration: 2,
                max_iterations: 8,
            },
        );
        assert_eq!(msg, "[q1 iter 2/8] executing...");
    }

    #[test]
    fn test_reflected_format() {
        let msg = format_event(
            "q2",
            &ProgressEvent::Reflected {
                iteration: 1,
                score: 0.7,
                threshold: 0.85,
            },
        );
        assert_eq!(msg, "[q2 iter 1] completeness=0.70 (threshold 0.85)");
    }

    #[test]
    fn test_deadline_format() {
        let msg = format_event("q1", &ProgressEvent::DeadlineReached { iterations: 2 });
        assert_eq!(msg, "[q1 deadline] stopping after 2 iteration(s)");
    }

    #[test]
    fn test_complete_format() {
        let msg = format_event(
            "q1",
            &ProgressEvent::Complete {
                iterations: 3,
                final_score: 0.95,
                termination: Termination::ThresholdMet,
            },
        );
        assert_eq!(
            msg,
            "[q1 done] completeness=0.95 iterations=3 (threshold met)"
        );
    }
}
