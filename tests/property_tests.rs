use chronoscope_tui::config::AppConfig;
use chronoscope_tui::internal::confidence::{ConfidenceTier, format_percent};
use chronoscope_tui::internal::upload::parse_dropped_paths;
use chronoscope_tui::internal::workflow::{WorkflowState, Workflow};
use chronoscope_tui::internal::models::{AnalysisResult, SelectedImage};
use proptest::prelude::*;

proptest! {
    #[test]
    fn tier_follows_thresholds(c in 0.0f64..=1.0) {
        let expected = if c >= 0.8 {
            ConfidenceTier::High
        } else if c >= 0.6 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        };
        prop_assert_eq!(ConfidenceTier::from_confidence(c), expected);
        prop_assert!(format_percent(c).ends_with('%'));
        prop_assert_ne!(format_percent(c), "--%");
    }

    #[test]
    fn out_of_range_is_low(c in prop_oneof![-1e9f64..-1e-9, 1.000_001f64..1e9]) {
        prop_assert_eq!(ConfidenceTier::from_confidence(c), ConfidenceTier::Low);
        prop_assert_eq!(format_percent(c), "--%");
    }

    #[test]
    fn dropped_text_parsing_never_panics(s in "\\PC*") {
        for path in parse_dropped_paths(&s) {
            prop_assert!(!path.as_os_str().is_empty());
        }
    }

    #[test]
    fn config_parsing_resilience(s in "\\PC*") {
        // Random input may fail to parse but must not panic.
        let _ = AppConfig::from_ron(&s);
    }

    /// Whatever the user does while a request is in flight, the outcome lands
    /// on the image that was submitted.
    #[test]
    fn analysis_outcome_belongs_to_submitted_image(
        interruptions in prop::collection::vec(0u8..3, 0..8),
        succeed in any::<bool>(),
    ) {
        let mut workflow = Workflow::new();
        workflow.select_image(SelectedImage::new("first.jpg", vec![1])).unwrap();
        workflow.begin_analysis().unwrap();

        for op in interruptions {
            match op {
                0 => { let _ = workflow.select_image(SelectedImage::new("other.jpg", vec![2])); }
                1 => { let _ = workflow.clear(); }
                _ => { let _ = workflow.begin_analysis(); }
            }
            prop_assert!(workflow.is_processing());
        }

        let outcome = match succeed {
            true => Ok(AnalysisResult {
                landmark: "Pantheon".to_string(),
                confidence: 0.7,
                summary: "Temple.".to_string(),
                year_built: None,
                location: None,
                image_url: None,
                audio_url: None,
                reference_url: None,
            }),
            false => Err("failed".to_string()),
        };
        prop_assert!(workflow.finish_analysis(outcome));
        let is_settled = matches!(
            workflow.state(),
            WorkflowState::Result { .. } | WorkflowState::Failed { .. }
        );
        prop_assert!(is_settled);
        prop_assert_eq!(workflow.image().map(|i| i.filename.as_str()), Some("first.jpg"));
    }
}
