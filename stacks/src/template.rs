use eyre::WrapErr;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// A single logical resource of a CloudFormation template
#[derive(Clone, Debug, PartialEq)]
pub struct CfnResource {
    pub name: String,
    pub resource: Value,
}

impl CfnResource {
    pub fn new(name: &str, resource: Value) -> Self {
        CfnResource {
            name: name.to_string(),
            resource,
        }
    }
}

/// CloudFormation document assembled by a stack
///
/// Resources and outputs are kept in key order, so two templates built from
/// the same input render to the same bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    description: String,
    resources: BTreeMap<String, Value>,
    outputs: BTreeMap<String, Value>,
}

impl Template {
    pub fn new(description: &str) -> Self {
        Template {
            description: description.to_string(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Add a resource to the CFN template
    pub fn add_resource(&mut self, CfnResource { name, resource }: CfnResource) {
        self.resources.insert(name, resource);
    }

    pub fn add_resources(&mut self, resources: impl IntoIterator<Item = CfnResource>) {
        for resource in resources {
            self.add_resource(resource);
        }
    }

    /// Add a stack output, visible in `describe-stacks`
    pub fn add_output(&mut self, name: &str, value: Value, description: &str) {
        self.outputs.insert(
            name.to_string(),
            json!({
                "Description": description,
                "Value": value,
            }),
        );
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.resources.get(logical_id)
    }

    pub fn resources(&self) -> &BTreeMap<String, Value> {
        &self.resources
    }

    pub fn outputs(&self) -> &BTreeMap<String, Value> {
        &self.outputs
    }

    pub fn to_value(&self) -> Value {
        let mut template = json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Description": self.description,
            "Resources": self.resources,
        });

        if !self.outputs.is_empty() {
            template["Outputs"] = json!(self.outputs);
        }

        template
    }

    /// Template body as submitted to CloudFormation
    pub fn to_json(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(&self.to_value()).wrap_err("Failed to serialize template")
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// `{"Ref": logical_id}`
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{"Fn::GetAtt": [logical_id, attribute]}`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{"Fn::Sub": expression}`
pub fn sub(expression: &str) -> Value {
    json!({ "Fn::Sub": expression })
}
