use brace::{MapsAndLists, RenderOptions, Template, TemplateMap, YamlValue};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;

use serde::Deserialize;
use serde_yaml::Mapping as YamlMapping;

#[test]
fn sequence_check_test() -> Result<(), String> {
    run_spec_file("~sequence-check", true)
}

#[test]
fn lambdas_test() -> Result<(), String> {
    run_spec_file("~lambdas", true)
}

fn run_spec_file(name: &str, log: bool) -> Result<(), String> {
    yaml_spec(name)?
        .tests
        .iter()
        .fold(Ok(()), |acc, test| match (acc, run_spec_test(test, log)) {
            (acc, Ok(())) => acc,
            (Ok(()), Err(err)) => Err(format!("specs ({}): {}", name, err)),
            (Err(err1), Err(err2)) => Err(format!("{}, {}", err1, err2)),
        })
}

#[derive(Deserialize, Debug)]
struct YamlSpecFile {
    tests: Vec<YamlTestSpec>,
}

#[derive(Deserialize, Debug)]
struct YamlTestSpec {
    name: String,
    data: YamlValue,
    template: String,
    partials: Option<YamlMapping>,
    expected: String,
}

fn yaml_spec(name: &str) -> Result<YamlSpecFile, String> {
    let path = format!("tests/altspecs/{}.yml", name);
    let text = fs::read_to_string(path).map_err(|err| format!("io: {}", err.to_string()))?;
    serde_yaml::from_str::<YamlSpecFile>(&text).map_err(|err| format!("yaml: {}", err.to_string()))
}

fn run_spec_test(test: &YamlTestSpec, log: bool) -> Result<(), String> {
    let template =
        Template::from(&test.template).map_err(|err| format!("{}: {}", test.name, err))?;
    let sources = match &test.partials {
        Some(values) => values
            .iter()
            .map(|(name, text)| (name.as_str().unwrap(), text.as_str().unwrap()))
            .collect::<HashMap<_, _>>(),
        None => HashMap::new(),
    };
    let partials =
        TemplateMap::new(sources).map_err(|err| format!("{}: partials: {}", test.name, err))?;
    let data = maps_and_lists(&test.data);
    let options = RenderOptions {
        partials: Some(&partials),
        ..RenderOptions::default()
    };
    let mut sink = Vec::new();
    template
        .render_with(&data, &mut sink, &options)
        .map_err(|err| format!("{}: render: {}", test.name, err))?;
    let result = String::from_utf8(sink).unwrap();
    if result != test.expected {
        if log {
            println!("{}: fail", test.name);
            println!("expected:\n{}", test.expected);
            println!("received:\n{}\n", result);
        };
        Err(test.name.to_owned())
    } else {
        if log {
            println!("{}: ok", test.name);
        }
        Ok(())
    }
}

fn maps_and_lists(yaml: &YamlValue) -> MapsAndLists {
    match yaml {
        YamlValue::Bool(flag) => MapsAndLists::bool(*flag),
        YamlValue::Number(number) => match number.as_i64() {
            Some(int) => MapsAndLists::int(int),
            None => MapsAndLists::float(number.as_f64().unwrap()),
        },
        YamlValue::String(text) => MapsAndLists::text(text),
        YamlValue::Mapping(members) => MapsAndLists::mapping(
            members
                .iter()
                .map(|(key, value)| {
                    (key.as_str().unwrap().to_owned(), maps_and_lists(value))
                })
                .collect::<HashMap<_, _>>(),
        ),
        YamlValue::Sequence(items) => {
            MapsAndLists::sequence(items.iter().map(maps_and_lists).collect::<Vec<_>>())
        }
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let value = tagged.value.as_str().unwrap_or_default().to_owned();
            match tag.as_str() {
                "!lambda0_str" => MapsAndLists::lambda0(move || value.clone()),
                "!lambda1_str" => MapsAndLists::lambda1(move |body| value.replace("{}", body)),
                "!lambda0_fn" if value == "counter" => {
                    let counter = RefCell::new(1);
                    MapsAndLists::lambda0(move || {
                        let next = { *counter.borrow() } + 1;
                        counter.replace(next).to_string()
                    })
                }
                "!lambda1_fn" if value == "check_x" => MapsAndLists::lambda1(|body| {
                    (if body == "{{x}}" { "yes" } else { "no" }).to_owned()
                }),
                "!lambda_fail" => MapsAndLists::lambda(|_| None),
                _ => MapsAndLists::null(),
            }
        }
        _ => MapsAndLists::null(),
    }
}
