#[cfg(test)]
mod model_tests {
    use jiff::Timestamp;

    use crate::models::{Plan, PlanStatus, Project, PromptStatus};

    fn create_test_project(credentials: Option<&str>) -> Project {
        Project {
            id: 7,
            name: "network".to_string(),
            description: None,
            cloud_provider: "aws".to_string(),
            state_bucket_url: Some("s3://tf-state/network".to_string()),
            state_bucket_credentials: credentials.map(String::from),
            llm_provider: Some("gemini".to_string()),
            applied_config: None,
            created_at: Timestamp::from_second(1640995200).unwrap(), // 2022-01-01 00:00:00 UTC
            updated_at: Timestamp::from_second(1641081600).unwrap(), // 2022-01-02 00:00:00 UTC
        }
    }

    #[test]
    fn test_plan_status_round_trips_through_strings() {
        for status in [
            PlanStatus::Pending,
            PlanStatus::Approved,
            PlanStatus::Applied,
            PlanStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PlanStatus>(), Ok(status));
        }
        assert_eq!("APPROVED".parse::<PlanStatus>(), Ok(PlanStatus::Approved));
        assert!("archived".parse::<PlanStatus>().is_err());
    }

    #[test]
    fn test_plan_status_transitions() {
        use PlanStatus::*;

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Failed));
        assert!(Approved.can_transition_to(Applied));
        assert!(Approved.can_transition_to(Failed));

        // No skipping the approval gate and nothing leaves a terminal state
        assert!(!Pending.can_transition_to(Applied));
        assert!(!Approved.can_transition_to(Approved));
        for next in [Pending, Approved, Applied, Failed] {
            assert!(!Applied.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(PlanStatus::Applied.is_terminal());
        assert!(PlanStatus::Failed.is_terminal());
        assert!(!PlanStatus::Pending.is_terminal());
        assert!(!PlanStatus::Approved.is_terminal());
    }

    #[test]
    fn test_prompt_status_parsing() {
        assert_eq!("destroyed".parse::<PromptStatus>(), Ok(PromptStatus::Destroyed));
        assert_eq!(PromptStatus::default(), PromptStatus::Pending);
        assert!("approved".parse::<PromptStatus>().is_err());
    }

    #[test]
    fn test_state_credentials_decoding() {
        let project = create_test_project(Some(r#"{"region": "eu-west-1"}"#));
        let credentials = project.state_credentials().expect("valid blob");
        assert_eq!(credentials["region"], "eu-west-1");

        let empty = create_test_project(None).state_credentials().expect("empty blob");
        assert!(empty.as_object().is_some_and(|o| o.is_empty()));

        assert!(create_test_project(Some("not json")).state_credentials().is_err());
    }

    #[test]
    fn test_project_serialization_omits_credentials() {
        let project = create_test_project(Some(r#"{"secret": "hunter2"}"#));
        let json = serde_json::to_string(&project).expect("serializable");
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"name\":\"network\""));
    }

    #[test]
    fn test_plan_serialization() {
        let plan = Plan {
            id: 1,
            project_id: 7,
            prompt_id: None,
            config_text: "resource \"null_resource\" \"a\" {}".to_string(),
            plan_output: "Plan: 1 to add".to_string(),
            plan_structured: Some(serde_json::json!({"format_version": "1.2"})),
            has_changes: true,
            status: PlanStatus::Approved,
            commit_message: Some("Add null resource".to_string()),
            created_at: Timestamp::from_second(1640995200).unwrap(),
            applied_at: None,
        };

        let value = serde_json::to_value(&plan).expect("serializable");
        assert_eq!(value["status"], "approved");
        assert_eq!(value["plan_structured"]["format_version"], "1.2");

        let back: Plan = serde_json::from_value(value).expect("deserializable");
        assert_eq!(back, plan);
    }
}
