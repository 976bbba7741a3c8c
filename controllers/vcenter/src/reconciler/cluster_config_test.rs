//! Unit tests for the ESXi cluster configuration controller

#[cfg(test)]
mod tests {
    use crate::reconciler::cluster_config::ClusterConfigController;
    use crate::reconciler::ConfigController;
    use crate::test_utils::*;
    use drift_spec::{ComplianceStatus, RemediateStatus, TargetType};
    use serde_json::json;

    const CLUSTER_ID: &str = "domain-c8";
    const CONFIG_PATH: &str = "/api/esx/settings/clusters/domain-c8/configuration";
    const CHECK_PATH: &str = "/api/esx/settings/clusters/domain-c8/configuration?action=check-compliance&vmw-task=true";
    const IMPORT_PATH: &str = "/api/esx/settings/clusters/domain-c8/configuration?action=import&vmw-task=true";
    const APPLY_PATH: &str = "/api/esx/settings/clusters/domain-c8/configuration?action=apply&vmw-task=true";

    fn controller() -> ClusterConfigController {
        ClusterConfigController::new(CLUSTER_ID)
    }

    fn desired() -> serde_json::Value {
        json!({"profile": {"esx": {"network": {"vswitches": []}}}})
    }

    /// Store `config` as the cluster's configuration, encoded as vCenter returns it
    fn store_config(client: &vcenter_client::MockVcenterClient, config: &serde_json::Value) {
        client.set_document(CONFIG_PATH, json!({"config": config.to_string()}));
    }

    #[tokio::test]
    async fn test_compliant_cluster_uses_task_summary() {
        let (client, reconciler) = create_test_reconciler();
        store_config(&client, &desired());
        queue_task(
            &client,
            CHECK_PATH,
            TEST_TASK_ID,
            json!({
                "status": "SUCCEEDED",
                "result": {
                    "cluster_status": "COMPLIANT",
                    "summary": {"default_message": "All hosts compliant"},
                    "end_time": "2024-01-01T00:00:00Z"
                }
            }),
        );

        let response = controller().check_compliance(&reconciler, &desired()).await;

        assert_eq!(response.status, ComplianceStatus::Compliant);
        let drift = response.result.expect("compliant drift is wrapped under result");
        assert_eq!(drift.description, "All hosts compliant");
        assert_eq!(drift.timestamp, "2024-01-01T00:00:00Z");
        assert_eq!(drift.target.target_type, TargetType::Cluster);
        assert_eq!(drift.target.id.as_deref(), Some(CLUSTER_ID));
        assert_eq!(drift.target.hostname, TEST_HOSTNAME);
    }

    #[tokio::test]
    async fn test_unknown_cluster_status_fails() {
        let (client, reconciler) = create_test_reconciler();
        store_config(&client, &desired());
        queue_task(
            &client,
            CHECK_PATH,
            "check-task",
            succeeded_task(json!({"cluster_status": "TEST"})),
        );

        let response = controller().check_compliance(&reconciler, &desired()).await;

        assert_eq!(response.status, ComplianceStatus::Failed);
        let drift = response.message.expect("failed drift is wrapped under message");
        assert_eq!(drift.errors.len(), 1);
        assert_eq!(drift.errors[0].message(), "Unknown status[TEST] for task check-task");
        assert!(drift.id.is_none());
    }

    #[tokio::test]
    async fn test_non_mapping_desired_is_rejected() {
        let (client, reconciler) = create_test_reconciler();

        let response = controller().check_compliance(&reconciler, &json!(["not", "a", "mapping"])).await;

        assert_eq!(response.status, ComplianceStatus::Failed);
        let drift = response.message.expect("failed drift");
        assert!(drift.errors[0].message().contains("must be a mapping"));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_task_timeout_is_reported() {
        let (client, reconciler) = create_test_reconciler();
        store_config(&client, &desired());
        client.set_post_response(CHECK_PATH, json!("slow-task"));
        client.set_task_states("slow-task", vec![json!({"status": "RUNNING"})]);
        let reconciler = crate::reconciler::Reconciler {
            task_timeout: std::time::Duration::ZERO,
            ..reconciler
        };

        let response = controller().check_compliance(&reconciler, &desired()).await;

        assert_eq!(response.status, ComplianceStatus::Failed);
        let drift = response.message.expect("failed drift");
        assert!(drift.errors[0].message().starts_with("Task timeout"));
        assert_eq!(drift.errors[0].source.endpoint.as_deref(), Some(CHECK_PATH));
    }

    #[tokio::test]
    async fn test_set_imports_merged_document_then_applies() {
        let (client, reconciler) = create_test_reconciler();
        client.set_document(
            CONFIG_PATH,
            json!({"config": "{\"profile\":{\"esx\":{\"system\":{\"ssh\":false}}}}"}),
        );
        queue_task(&client, IMPORT_PATH, "import-task", succeeded_task(json!({"status": "SUCCESS"})));
        queue_task(&client, APPLY_PATH, "apply-task", succeeded_task(json!({"status": "SUCCESS"})));

        let response = controller()
            .set(&reconciler, &json!({"profile": {"esx": {"system": {"ssh": true}}}}))
            .await;

        assert_eq!(response.status, RemediateStatus::Success);
        let posts = client.requests_with_method("POST");
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].path, IMPORT_PATH);
        let imported = posts[0].body.as_ref().and_then(|b| b["config"].as_str()).expect("config text");
        let imported: serde_json::Value = serde_json::from_str(imported).unwrap();
        assert_eq!(imported, json!({"profile": {"esx": {"system": {"ssh": true}}}}));
        assert_eq!(posts[1].path, APPLY_PATH);
    }

    #[tokio::test]
    async fn test_set_stops_when_import_fails() {
        let (client, reconciler) = create_test_reconciler();
        client.set_document(CONFIG_PATH, json!({}));
        queue_task(&client, IMPORT_PATH, "import-task", failed_task("Invalid configuration document"));

        let response = controller().set(&reconciler, &desired()).await;

        assert_eq!(response.status, RemediateStatus::Failed);
        assert_eq!(response.errors, vec!["Invalid configuration document".to_string()]);
        assert_eq!(client.requests_with_method("POST").len(), 1);
    }

    #[tokio::test]
    async fn test_get_decodes_configuration_text() {
        let (client, reconciler) = create_test_reconciler();
        client.set_document(
            CONFIG_PATH,
            json!({"config": "{\"profile\":{\"esx\":{\"system\":{\"ssh\":false}}}}"}),
        );

        let response = controller().get(&reconciler, None).await;

        assert_eq!(response.result, json!({"profile": {"esx": {"system": {"ssh": false}}}}));
    }

    #[tokio::test]
    async fn test_remediate_reports_failed_check() {
        let (client, reconciler) = create_test_reconciler();
        store_config(&client, &desired());
        queue_task(&client, CHECK_PATH, TEST_TASK_ID, failed_task("Cluster not managed by a single image"));

        let response = controller().remediate(&reconciler, &desired()).await;

        assert_eq!(response.status, RemediateStatus::Failed);
        assert_eq!(response.errors, vec!["Cluster not managed by a single image".to_string()]);
        assert!(response.changes.is_none());
    }

    #[tokio::test]
    async fn test_non_compliant_cluster_reports_summary_message() {
        let (client, reconciler) = create_test_reconciler();
        store_config(&client, &desired());
        queue_task(
            &client,
            CHECK_PATH,
            TEST_TASK_ID,
            succeeded_task(json!({
                "cluster_status": "NON_COMPLIANT",
                "summary": {"default_message": "2 hosts are out of compliance"}
            })),
        );

        let response = controller().check_compliance(&reconciler, &desired()).await;

        assert_eq!(response.status, ComplianceStatus::NonCompliant);
        let drift = response.result.expect("non-compliant drift is wrapped under result");
        assert_eq!(drift.description, "2 hosts are out of compliance");
        assert!(drift.result.is_some_and(|result| result.additions.is_empty() && result.modifications.is_empty()));
    }

    #[tokio::test]
    async fn test_desired_drift_overrides_compliant_task() {
        let (client, reconciler) = create_test_reconciler();
        store_config(&client, &json!({"profile": {"esx": {"system": {"ssh": false, "timeout": 900}}}}));
        queue_task(
            &client,
            CHECK_PATH,
            TEST_TASK_ID,
            succeeded_task(json!({"cluster_status": "COMPLIANT"})),
        );

        let response = controller()
            .check_compliance(&reconciler, &json!({"profile": {"esx": {"system": {"ssh": true}}}}))
            .await;

        assert_eq!(response.status, ComplianceStatus::NonCompliant);
        let result = response.result.and_then(|drift| drift.result).expect("drift result");
        assert_eq!(result.modifications.len(), 1);
        assert_eq!(result.modifications[0].key, "profile.esx.system.ssh");
        assert_eq!(result.modifications[0].current_value, json!(false));
        assert_eq!(result.modifications[0].desired_value, json!(true));
    }

    #[tokio::test]
    async fn test_remediate_applies_desired_drift() {
        let (client, reconciler) = create_test_reconciler();
        store_config(&client, &json!({"profile": {"esx": {"system": {"ssh": false}}}}));
        queue_task(
            &client,
            CHECK_PATH,
            TEST_TASK_ID,
            succeeded_task(json!({"cluster_status": "COMPLIANT"})),
        );
        queue_task(&client, IMPORT_PATH, "import-task", succeeded_task(json!({"status": "SUCCESS"})));
        queue_task(&client, APPLY_PATH, "apply-task", succeeded_task(json!({"status": "SUCCESS"})));

        let response = controller()
            .remediate(&reconciler, &json!({"profile": {"esx": {"system": {"ssh": true}}}}))
            .await;

        assert_eq!(response.status, RemediateStatus::Success);
        let changes = response.changes.expect("changes");
        assert_eq!(changes.modifications[0].key, "profile.esx.system.ssh");
        let posts: Vec<_> = client.requests_with_method("POST").into_iter().map(|r| r.path).collect();
        assert_eq!(posts, vec![CHECK_PATH, IMPORT_PATH, APPLY_PATH]);
    }
}
