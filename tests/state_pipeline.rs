use std::fs;
use std::path::Path;

use cf_tf_diff::providers::TypedResource;
use cf_tf_diff::providers::cloudflare::CloudflareResource;
use cf_tf_diff::{Error, Project, ProviderRegistry};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATE: &str = r#"{
    "version": 4,
    "terraform_version": "1.6.0",
    "resources": [
        {
            "mode": "managed",
            "type": "cloudflare_zone",
            "name": "main",
            "provider": "provider[\"registry.terraform.io/cloudflare/cloudflare\"]",
            "instances": [
                {
                    "attributes": {
                        "id": "z1",
                        "zone": "example.com",
                        "plan": "free",
                        "meta": {"wildcard_proxiable": "false", "phishing_detected": "false"},
                        "vanity_name_servers": null
                    }
                }
            ]
        },
        {
            "mode": "managed",
            "type": "cloudflare_record",
            "name": "www",
            "provider": "provider[\"registry.terraform.io/cloudflare/cloudflare\"]",
            "instances": [
                {
                    "attributes": {"id": "r1", "zone_id": "z1", "name": "www", "type": "CNAME", "value": "example.com", "hostname": "www.example.com", "ttl": 1, "priority": null},
                    "dependencies": ["cloudflare_zone.main"]
                }
            ]
        }
    ]
}"#;

fn write_backend(dir: &Path, backend: serde_json::Value) {
    fs::create_dir_all(dir.join(".terraform")).unwrap();
    let descriptor = serde_json::json!({"version": 3, "serial": 1, "backend": backend});
    fs::write(
        dir.join(".terraform/terraform.tfstate"),
        serde_json::to_vec(&descriptor).unwrap(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_local_project_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_backend(
        dir.path(),
        serde_json::json!({"type": "local", "config": {"path": null, "workspace_dir": null}}),
    );
    fs::write(dir.path().join("terraform.tfstate"), STATE).unwrap();

    let resources = Project::new(dir.path())
        .load_resources(&ProviderRegistry::with_defaults())
        .await
        .unwrap();

    assert_eq!(resources.len(), 2);

    let record = &resources.get("cloudflare_record")[0];
    assert_eq!(record.address, "cloudflare_record.www");
    assert_eq!(record.zone_id(), Some("z1"));
    assert_eq!(record.dependencies, vec!["cloudflare_zone.main".to_string()]);
    match &record.body.item {
        TypedResource::Cloudflare(CloudflareResource::Record(r)) => {
            assert_eq!(r.content, "example.com");
            assert_eq!(r.zone_name, "www.example.com");
            assert_eq!(r.priority, None);
        }
        other => panic!("expected DNS record, got {:?}", other),
    }

    let zone = &resources.get("cloudflare_zone")[0];
    assert_eq!(zone.zone_id(), Some("z1"));
    match &zone.body.item {
        TypedResource::Cloudflare(CloudflareResource::Zone(z)) => {
            assert_eq!(z.name, "example.com");
            assert_eq!(z.plan.name, "free");
            assert!(!z.meta.wildcard_proxiable);
        }
        other => panic!("expected zone, got {:?}", other),
    }
}

#[tokio::test]
async fn test_project_without_backend_file_reads_local_state() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("terraform.tfstate"), STATE).unwrap();

    let state = Project::new(dir.path()).read_state().await.unwrap();
    assert_eq!(state.resources.len(), 2);
}

#[tokio::test]
async fn test_http_project_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tf/prod"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATE))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_backend(
        dir.path(),
        serde_json::json!({
            "type": "http",
            "config": {"address": format!("{}/tf/prod", server.uri()), "retry_max": 2}
        }),
    );

    let resources = Project::new(dir.path())
        .load_resources(&ProviderRegistry::with_defaults())
        .await
        .unwrap();
    assert_eq!(resources.get("cloudflare_zone").len(), 1);
}

#[tokio::test]
async fn test_unknown_resource_type_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("terraform.tfstate"),
        r#"{"version": 4, "resources": [{"mode": "managed", "type": "cloudflare_nonexistent", "name": "x", "instances": [{"attributes": {}}]}]}"#,
    )
    .unwrap();

    let result = Project::new(dir.path())
        .load_resources(&ProviderRegistry::with_defaults())
        .await;
    assert!(matches!(result, Err(Error::Provider(_))));
}

#[tokio::test]
async fn test_unsupported_backend_type() {
    let dir = tempfile::tempdir().unwrap();
    write_backend(dir.path(), serde_json::json!({"type": "azurerm", "config": {}}));

    let result = Project::new(dir.path()).read_state().await;
    match result {
        Err(Error::Backend(err)) => {
            assert_eq!(err.to_string(), "unsupported backend type: azurerm");
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_local_state_file() {
    let dir = tempfile::tempdir().unwrap();
    write_backend(dir.path(), serde_json::json!({"type": "local", "config": {}}));

    let result = Project::new(dir.path()).read_state().await;
    assert!(matches!(result, Err(Error::Backend(_))));
}
