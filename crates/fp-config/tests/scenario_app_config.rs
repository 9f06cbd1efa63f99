use fp_config::{load_layered_yaml_from_strings, AppConfig};

#[test]
fn empty_document_yields_defaults() {
    let loaded = load_layered_yaml_from_strings(&["{}"]).unwrap();
    let cfg = AppConfig::from_json(&loaded.config_json).unwrap();

    assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:8787");
    assert_eq!(cfg.pricing.bw_price_paise, 300);
    assert_eq!(cfg.pricing.color_price_paise, 1200);
    assert_eq!(cfg.pricing.bw_cost_paise, 100);
    assert_eq!(cfg.pricing.color_cost_paise, 500);
    assert_eq!(cfg.limits.max_copies, 100);
    assert_eq!(cfg.timezone, chrono_tz::Asia::Kolkata);
    assert_eq!(cfg.exports_dir.to_str(), Some("exports/daily-reports"));
    assert_eq!(cfg.setup_key_env, "FP_ADMIN_SETUP_KEY");
}

#[test]
fn overrides_are_applied() {
    let yaml = r#"
server:
  bind_addr: "0.0.0.0:9000"
pricing:
  bw_price_per_page: 2.5
orders:
  max_copies: 20
reporting:
  timezone: "UTC"
payment:
  upi_vpa: "shop@okbank"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let cfg = AppConfig::from_json(&loaded.config_json).unwrap();

    assert_eq!(cfg.bind_addr.port(), 9000);
    assert_eq!(cfg.pricing.bw_price_paise, 250);
    assert_eq!(cfg.pricing.color_price_paise, 1200);
    assert_eq!(cfg.limits.max_copies, 20);
    assert_eq!(cfg.timezone, chrono_tz::UTC);
    assert_eq!(cfg.upi_vpa, "shop@okbank");
}

#[test]
fn invalid_values_are_errors() {
    for yaml in [
        "reporting:\n  timezone: \"Mars/Olympus\"\n",
        "server:\n  bind_addr: \"not an address\"\n",
        "orders:\n  max_copies: 0\n",
        "pricing:\n  bw_price_per_page: \"three\"\n",
    ] {
        let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
        assert!(
            AppConfig::from_json(&loaded.config_json).is_err(),
            "expected error for {yaml:?}"
        );
    }
}
