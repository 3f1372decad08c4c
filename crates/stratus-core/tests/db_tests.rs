use serde_json::json;
use stratus_core::{
    params::{NewPlan, NewPrompt},
    CreateProject, Database, PlanStatus, PreconditionViolation, PromptStatus, ResourceRecord,
    StratusError, UpdateProject,
};
use tempfile::NamedTempFile;

/// Helper function to create a temporary database for testing
fn create_test_db() -> (NamedTempFile, Database) {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    let db = Database::new(temp_file.path()).expect("Failed to create test database");
    (temp_file, db)
}

fn create_project(db: &mut Database, name: &str) -> u64 {
    db.create_project(&CreateProject {
        name: name.to_string(),
        cloud_provider: "AWS".to_string(),
        ..Default::default()
    })
    .expect("Failed to create project")
    .id
}

fn new_plan(project_id: u64, prompt_id: Option<u64>, config: &str) -> NewPlan {
    NewPlan {
        project_id,
        prompt_id,
        config_text: config.to_string(),
        plan_output: "Plan: 1 to add".to_string(),
        plan_structured: Some(json!({"format_version": "1.2"})),
        has_changes: true,
        commit_message: Some("Add bucket".to_string()),
    }
}

fn record(address: &str, resource_type: &str) -> ResourceRecord {
    ResourceRecord {
        address: address.to_string(),
        resource_type: resource_type.to_string(),
        name: address.rsplit('.').next().unwrap_or(address).to_string(),
        attributes: json!({"tags": {"env": "dev"}}),
        dependencies: vec![],
    }
}

#[test]
fn test_create_project_normalizes_and_rejects_duplicates() {
    let (_temp_file, mut db) = create_test_db();

    let id = create_project(&mut db, "  network ");
    let project = db.require_project(id).unwrap();
    assert_eq!(project.name, "network");
    assert_eq!(project.cloud_provider, "aws");
    assert!(project.applied_config.is_none());

    let err = db
        .create_project(&CreateProject {
            name: "network".to_string(),
            cloud_provider: "gcp".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, StratusError::InvalidInput { ref field, .. } if field == "name"));

    assert!(matches!(
        db.require_project(999),
        Err(StratusError::ProjectNotFound { id: 999 })
    ));
}

#[test]
fn test_update_project_merges_fields_and_keeps_names_unique() {
    let (_temp_file, mut db) = create_test_db();
    let id = db
        .create_project(&CreateProject {
            name: "network".to_string(),
            description: Some("Shared VPC".to_string()),
            cloud_provider: "aws".to_string(),
            llm_provider: Some("anthropic".to_string()),
            ..Default::default()
        })
        .unwrap()
        .id;
    create_project(&mut db, "storage");
    let before = db.require_project(id).unwrap();

    let updated = db
        .update_project(&UpdateProject {
            id,
            name: Some(" core-network ".to_string()),
            cloud_provider: Some("GCP".to_string()),
            state_bucket_url: Some("gs://tf-state".to_string()),
            llm_provider: Some(String::new()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(updated.name, "core-network");
    assert_eq!(updated.cloud_provider, "gcp");
    assert_eq!(updated.description.as_deref(), Some("Shared VPC"));
    assert_eq!(updated.state_bucket_url.as_deref(), Some("gs://tf-state"));
    assert!(updated.llm_provider.is_none());
    assert!(updated.updated_at >= before.updated_at);

    let stored = db.require_project(id).unwrap();
    assert_eq!(stored.name, "core-network");
    assert!(stored.llm_provider.is_none());
    assert_eq!(stored.created_at, before.created_at);

    let err = db
        .update_project(&UpdateProject {
            id,
            name: Some("storage".to_string()),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, StratusError::InvalidInput { ref field, .. } if field == "name"));
    assert_eq!(db.require_project(id).unwrap().name, "core-network");

    assert!(matches!(
        db.update_project(&UpdateProject {
            id: 999,
            description: Some("gone".to_string()),
            ..Default::default()
        }),
        Err(StratusError::ProjectNotFound { id: 999 })
    ));
}

#[test]
fn test_projects_are_listed_by_name() {
    let (_temp_file, mut db) = create_test_db();
    create_project(&mut db, "zeta");
    create_project(&mut db, "alpha");

    let names: Vec<String> = db.list_projects().unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[test]
fn test_plans_are_inserted_pending_and_listed_newest_first() {
    let (_temp_file, mut db) = create_test_db();
    let project_id = create_project(&mut db, "plans");

    let first = db.insert_plan(&new_plan(project_id, None, "first")).unwrap();
    let second = db.insert_plan(&new_plan(project_id, None, "second")).unwrap();
    assert_eq!(first.status, PlanStatus::Pending);

    let plans = db.list_plans(project_id).unwrap();
    assert_eq!(
        plans.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );
    assert_eq!(plans[1].plan_structured, Some(json!({"format_version": "1.2"})));
    assert_eq!(plans[1].config_text, "first");
}

#[test]
fn test_transitions_are_compare_and_set() {
    let (_temp_file, mut db) = create_test_db();
    let project_id = create_project(&mut db, "cas");
    let plan = db.insert_plan(&new_plan(project_id, None, "x")).unwrap();

    let approved = db
        .transition_plan(plan.id, PlanStatus::Pending, PlanStatus::Approved)
        .unwrap();
    assert_eq!(approved.status, PlanStatus::Approved);

    // A second writer still expecting `pending` loses
    let err = db
        .transition_plan(plan.id, PlanStatus::Pending, PlanStatus::Approved)
        .unwrap_err();
    assert!(matches!(
        err,
        StratusError::Precondition(PreconditionViolation::NotPending { .. })
    ));

    // Illegal edges are refused before touching the row
    let err = db
        .transition_plan(plan.id, PlanStatus::Failed, PlanStatus::Approved)
        .unwrap_err();
    assert!(matches!(err, StratusError::Configuration { .. }));

    let err = db
        .transition_plan(404, PlanStatus::Approved, PlanStatus::Failed)
        .unwrap_err();
    assert!(matches!(err, StratusError::PlanNotFound { id: 404 }));
}

#[test]
fn test_record_apply_success_updates_plan_project_and_prompt() {
    let (_temp_file, mut db) = create_test_db();
    let project_id = create_project(&mut db, "apply");
    let prompt = db
        .create_prompt(
            project_id,
            &NewPrompt {
                user_prompt: "create a bucket".to_string(),
                code: Some("resource \"aws_s3_bucket\" \"b\" {}".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    let plan = db
        .insert_plan(&new_plan(project_id, Some(prompt.id), "applied config"))
        .unwrap();

    // Not approved yet
    assert!(matches!(
        db.record_apply_success(plan.id),
        Err(StratusError::Precondition(PreconditionViolation::NotApproved { .. }))
    ));

    db.transition_plan(plan.id, PlanStatus::Pending, PlanStatus::Approved)
        .unwrap();
    let applied = db.record_apply_success(plan.id).unwrap();
    assert_eq!(applied.status, PlanStatus::Applied);
    assert!(applied.applied_at.is_some());

    let project = db.require_project(project_id).unwrap();
    assert_eq!(project.applied_config.as_deref(), Some("applied config"));
    let prompt = db.get_prompt(prompt.id).unwrap().unwrap();
    assert_eq!(prompt.status, PromptStatus::Applied);
}

#[test]
fn test_replace_resources_is_scoped_to_project() {
    let (_temp_file, mut db) = create_test_db();
    let project_id = create_project(&mut db, "inventory");
    let other_id = create_project(&mut db, "other");

    db.replace_resources(other_id, &[record("aws_vpc.other", "aws_vpc")])
        .unwrap();
    db.replace_resources(
        project_id,
        &[record("aws_vpc.main", "aws_vpc"), record("aws_instance.web", "aws_instance")],
    )
    .unwrap();

    let written = db
        .replace_resources(project_id, &[record("aws_vpc.main", "aws_vpc")])
        .unwrap();
    assert_eq!(written, 1);

    let resources = db.list_resources(project_id).unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].record.address, "aws_vpc.main");
    assert_eq!(resources[0].record.attributes["tags"]["env"], "dev");

    assert_eq!(db.record_destroy(project_id).unwrap(), 1);
    assert!(db.list_resources(project_id).unwrap().is_empty());
    assert_eq!(db.list_resources(other_id).unwrap().len(), 1);
}

#[test]
fn test_record_destroy_resets_project_and_prompts() {
    let (_temp_file, mut db) = create_test_db();
    let project_id = create_project(&mut db, "teardown");
    let prompt = db
        .create_prompt(
            project_id,
            &NewPrompt {
                user_prompt: "create a vpc".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
    let plan = db
        .insert_plan(&new_plan(project_id, Some(prompt.id), "vpc"))
        .unwrap();
    db.transition_plan(plan.id, PlanStatus::Pending, PlanStatus::Approved)
        .unwrap();
    db.record_apply_success(plan.id).unwrap();
    db.replace_resources(project_id, &[record("aws_vpc.main", "aws_vpc")])
        .unwrap();

    assert_eq!(db.record_destroy(project_id).unwrap(), 1);

    assert!(db.list_resources(project_id).unwrap().is_empty());
    assert!(db.require_project(project_id).unwrap().applied_config.is_none());
    let prompts = db.list_prompts(project_id).unwrap();
    assert_eq!(prompts[0].status, PromptStatus::Destroyed);
    // Plans keep their history
    assert_eq!(db.require_plan(plan.id).unwrap().status, PlanStatus::Applied);
}

#[test]
fn test_prompt_requires_existing_project() {
    let (_temp_file, mut db) = create_test_db();
    let err = db
        .create_prompt(
            77,
            &NewPrompt {
                user_prompt: "orphan".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StratusError::ProjectNotFound { id: 77 }));
}

#[test]
fn test_delete_project_cascades_to_ledger_rows() {
    let (_temp_file, mut db) = create_test_db();
    let project_id = create_project(&mut db, "cascade");
    let plan = db.insert_plan(&new_plan(project_id, None, "x")).unwrap();
    db.replace_resources(project_id, &[record("aws_vpc.main", "aws_vpc")])
        .unwrap();

    assert!(db.delete_project(project_id).unwrap());
    assert!(db.get_plan(plan.id).unwrap().is_none());
    assert!(db.list_resources(project_id).unwrap().is_empty());
    assert!(!db.delete_project(project_id).unwrap());
}
