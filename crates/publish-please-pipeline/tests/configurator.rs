use publish_please_core::{NpmInfo, ValidationSetting, CONFIG_FILE};
use publish_please_pipeline::{configure, ScriptedPrompt, ValidationRegistry};

#[tokio::test]
async fn answers_are_written_to_publishrc() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ValidationRegistry::standard(NpmInfo::default());
    let prompt = ScriptedPrompt::new([
        "npm run build", // pre-publish script
        "",              // post-publish script
        "",              // publish command
        "next",          // publish tag
        "n",             // confirm
        "n",             // vulnerableDependencies
        "",              // sensitiveData
        "y",             // uncommittedChanges
        "n",             // untrackedFiles
        "y",             // branch
        "/^release-.*$/",
        "y", // gitTag
        "pkg-v",
    ]);

    let cfg = configure(dir.path(), &registry, &prompt).await.unwrap();

    assert_eq!(cfg.pre_publish_script.as_deref(), Some("npm run build"));
    assert_eq!(cfg.post_publish_script, None);
    assert_eq!(cfg.publish_command, "npm publish");
    assert_eq!(cfg.publish_tag, "next");
    assert!(!cfg.confirm);
    assert!(cfg.validation("vulnerableDependencies").unwrap().is_disabled());
    assert_eq!(
        cfg.validation("sensitiveData"),
        Some(&ValidationSetting::enabled())
    );
    assert!(cfg.validation("untrackedFiles").unwrap().is_disabled());
    assert_eq!(
        cfg.validation("branch").unwrap().as_text(),
        Some("/^release-.*$/")
    );
    assert_eq!(cfg.validation("gitTag").unwrap().as_text(), Some("pkg-v"));
    assert_eq!(prompt.asked().len(), 13);

    let reloaded = registry.resolve_config(dir.path(), None).unwrap();
    assert_eq!(reloaded, cfg);
    assert!(dir.path().join(CONFIG_FILE).exists());
}

#[tokio::test]
async fn defaults_are_kept_when_every_answer_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ValidationRegistry::standard(NpmInfo::default());
    let prompt = ScriptedPrompt::new(Vec::<String>::new());

    let cfg = configure(dir.path(), &registry, &prompt).await.unwrap();
    let defaults = registry.resolve_config(tempfile::tempdir().unwrap().path(), None).unwrap();
    assert_eq!(cfg, defaults);
}
