// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use serde::Deserialize;
    use serde_json::{json, Value};

    use crate::compiler::{compile_output_length, compile_tasks, split_input, CompiledTask};
    use crate::config::{
        load_and_validate_definitions, load_config, load_input, load_profile, OutputMode,
    };
    use crate::errors::DefinitionError;

    const FUNCTION_PATH: &str = "definitions/product-match/function.json";
    const PROFILE_PATH: &str = "definitions/product-match/profile.json";
    const INPUT_PATH: &str = "definitions/product-match/input.json";
    const CASES_PATH: &str = "definitions/product-match/cases.json";

    #[derive(Debug, Deserialize)]
    struct SampleCase {
        value: Value,
        compiled_tasks: Vec<Value>,
        output_length: usize,
    }

    /// The sample definitions load and agree with each other
    #[test]
    fn test_product_match_definitions_load() {
        let (function, profile) =
            load_and_validate_definitions(FUNCTION_PATH, PROFILE_PATH).unwrap();

        assert_eq!(function.tasks.len(), 1);
        assert_eq!(profile.tasks.len(), 1);
        assert!(function.split_merge().is_some());
        assert!(function.input_maps.is_none());

        let task = &profile.tasks[0];
        assert_eq!(task.ensemble.llms.len(), 5);
        assert_eq!(task.profile, vec![1.0; 5]);
        assert_eq!(task.ensemble.llms[4].output_mode, OutputMode::Instruction);
        assert_eq!(task.ensemble.llms[3].top_logprobs, Some(20));
    }

    /// Test loading the engine configuration shipped with the crate
    #[test]
    fn test_engine_yaml_loading() {
        let config = load_config("configs/engine.yaml").unwrap();

        assert_eq!(config.executor_options.get_max_concurrency(), 8);
        assert_eq!(config.rng.get_seed(), 0);
        assert!(!config.split_batches);
    }

    #[test]
    fn test_sample_input_compiles() {
        let (function, _) = load_and_validate_definitions(FUNCTION_PATH, PROFILE_PATH).unwrap();
        let input = load_input(INPUT_PATH).unwrap();

        let compiled = compile_tasks(&function, &input).unwrap();
        assert_eq!(compiled.len(), 1);
        assert_eq!(
            compiled[0].summary(),
            json!({ "type": "vector.completion", "skipped": false, "mapped": null })
        );

        let payload = match &compiled[0] {
            CompiledTask::Compiled(payload) => payload,
            other => panic!("expected a compiled task, got {:?}", other),
        };
        let expected_prompt = "Customer need: \"A lightweight laptop for frequent travel with long battery life\"\n\n\
Products:\n\n\
- MacBook Air M3: 13.6-inch Retina display, M3 chip, 1.24kg, 18-hour battery life, fanless design\n\n\
- Dell XPS 15: 15.6-inch OLED display, Intel Core i7, 1.86kg, 13-hour battery, powerful GPU\n\n\
- Lenovo ThinkPad X1 Carbon: 14-inch display, Intel Core Ultra, 1.12kg, 15-hour battery, military-grade durability";
        assert_eq!(payload.messages[1].content, json!(expected_prompt));
        assert_eq!(payload.responses.len(), 3);

        assert_eq!(compile_output_length(&function, &input).unwrap(), 3);
    }

    /// Every sample case compiles to the documented task summary and length
    #[test]
    fn test_sample_cases() {
        let (function, _) = load_and_validate_definitions(FUNCTION_PATH, PROFILE_PATH).unwrap();
        let cases: Vec<SampleCase> = load_input(CASES_PATH)
            .map(|v| serde_json::from_value(v).unwrap())
            .unwrap();
        assert_eq!(cases.len(), 10);

        for case in &cases {
            let compiled = compile_tasks(&function, &case.value).unwrap();
            let summaries: Vec<Value> = compiled.iter().map(CompiledTask::summary).collect();
            assert_eq!(summaries, case.compiled_tasks);

            let length = compile_output_length(&function, &case.value).unwrap();
            assert_eq!(length, case.output_length);

            let parts = split_input(&function, &case.value).unwrap().unwrap();
            assert_eq!(parts.len(), case.output_length);
            assert_eq!(parts[0]["need"], case.value["need"]);
            assert_eq!(parts[0]["products"], json!([case.value["products"][0]]));
        }
    }

    #[test]
    fn test_missing_definition_is_io_error() {
        let result = load_profile("definitions/does-not-exist/profile.json");
        assert!(matches!(result, Err(DefinitionError::Io { .. })));
    }

    #[test]
    fn test_mismatched_definitions_report_every_error() {
        let dir = tempfile::tempdir().unwrap();
        let profile_path = dir.path().join("profile.yaml");
        std::fs::write(
            &profile_path,
            r#"
tasks:
  - ensemble:
      llms: []
    profile: [1.0]
  - ensemble:
      llms:
        - model: openai/gpt-4o-mini
    profile: [1.0]
"#,
        )
        .unwrap();

        match load_and_validate_definitions(FUNCTION_PATH, &profile_path) {
            Err(DefinitionError::Validation(errors)) => assert!(errors.len() >= 3, "{:?}", errors),
            other => panic!("expected validation errors, got {:?}", other.map(|_| ())),
        }
    }
}
