//! Writer producing the layout Xcode itself saves.
//!
//! Objects are grouped into `/* Begin <isa> section */` blocks sorted by isa,
//! each block sorted by id. Build files and file references sit on one line.
//! Values that name another object carry a `/* display name */` annotation.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use super::ids::ObjectId;
use super::project::{ISA_BUILD_FILE, ISA_FILE_REFERENCE, ISA_PROJECT, Object, PbxProject};
use super::value::{Dict, Value};

const HEADER: &str = "// !$*UTF8*$!";
const INLINE_ISAS: &[&str] = &[ISA_BUILD_FILE, ISA_FILE_REFERENCE];
/// Keys whose id values Xcode writes without a `/* name */` comment.
const UNANNOTATED_KEYS: &[&str] = &["remoteGlobalIDString", "TestTargetID"];

static BARE_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_$/:.]+$").unwrap());

/// Serialize the whole project, including the trailing newline.
pub fn to_pbxproj(project: &PbxProject) -> String {
    let writer = Writer {
        annotations: annotations(project),
    };
    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str("\n{\n");

    let mut top: BTreeMap<&str, TopEntry<'_>> = project
        .header()
        .iter()
        .map(|(key, value)| (key.as_str(), TopEntry::Value(value)))
        .collect();
    top.insert("objects", TopEntry::Objects);
    let root = Value::from(project.root_object().as_str());
    top.insert("rootObject", TopEntry::Value(&root));

    for (key, entry) in top {
        match entry {
            TopEntry::Value(value) => writer.write_entry(&mut out, key, value, 1),
            TopEntry::Objects => writer.write_objects(&mut out, project),
        }
    }
    out.push_str("}\n");
    out
}

enum TopEntry<'a> {
    Value(&'a Value),
    Objects,
}

struct Writer {
    annotations: HashMap<String, String>,
}

impl Writer {
    fn write_objects(&self, out: &mut String, project: &PbxProject) {
        let mut sections: BTreeMap<&str, Vec<(&ObjectId, &Object)>> = BTreeMap::new();
        for (id, object) in project.objects() {
            sections.entry(object.isa()).or_default().push((id, object));
        }

        out.push_str("\tobjects = {\n");
        for (isa, objects) in sections {
            let _ = write!(out, "\n/* Begin {isa} section */\n");
            for (id, object) in objects {
                indent(out, 2);
                self.write_id(out, id.as_str());
                out.push_str(" = ");
                if INLINE_ISAS.contains(&isa) {
                    self.write_inline_dict(out, object.fields(), true);
                } else {
                    self.write_block_dict(out, object.fields(), 2, true);
                }
                out.push_str(";\n");
            }
            let _ = writeln!(out, "/* End {isa} section */");
        }
        out.push_str("\t};\n");
    }

    fn write_entry(&self, out: &mut String, key: &str, value: &Value, depth: usize) {
        indent(out, depth);
        out.push_str(&quote(key));
        out.push_str(" = ");
        match value {
            Value::String(s) if UNANNOTATED_KEYS.contains(&key) => out.push_str(&quote(s)),
            _ => self.write_block_value(out, value, depth),
        }
        out.push_str(";\n");
    }

    fn write_block_value(&self, out: &mut String, value: &Value, depth: usize) {
        match value {
            Value::String(s) => self.write_id(out, s),
            Value::Array(items) => {
                out.push_str("(\n");
                for item in items {
                    indent(out, depth + 1);
                    self.write_block_value(out, item, depth + 1);
                    out.push_str(",\n");
                }
                indent(out, depth);
                out.push(')');
            }
            Value::Dict(dict) => self.write_block_dict(out, dict, depth, false),
        }
    }

    /// `isa_first` puts `isa` ahead of the sorted keys, as in object bodies.
    fn write_block_dict(&self, out: &mut String, dict: &Dict, depth: usize, isa_first: bool) {
        out.push_str("{\n");
        for (key, value) in ordered(dict, isa_first) {
            self.write_entry(out, key, value, depth + 1);
        }
        indent(out, depth);
        out.push('}');
    }

    fn write_inline_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::String(s) => self.write_id(out, s),
            Value::Array(items) => {
                out.push('(');
                for item in items {
                    self.write_inline_value(out, item);
                    out.push_str(", ");
                }
                out.push(')');
            }
            Value::Dict(dict) => self.write_inline_dict(out, dict, false),
        }
    }

    fn write_inline_dict(&self, out: &mut String, dict: &Dict, isa_first: bool) {
        out.push('{');
        for (key, value) in ordered(dict, isa_first) {
            out.push_str(&quote(key));
            out.push_str(" = ");
            self.write_inline_value(out, value);
            out.push_str("; ");
        }
        out.push('}');
    }

    /// Write a string, annotated when it names a known object.
    fn write_id(&self, out: &mut String, s: &str) {
        out.push_str(&quote(s));
        if let Some(name) = self.annotations.get(s) {
            let _ = write!(out, " /* {name} */");
        }
    }
}

fn ordered(dict: &Dict, isa_first: bool) -> Vec<(&str, &Value)> {
    let mut entries = Vec::with_capacity(dict.len());
    if isa_first {
        if let Some(isa) = dict.get("isa") {
            entries.push(("isa", isa));
        }
    }
    entries.extend(
        dict.iter()
            .filter(|(key, _)| !(isa_first && key.as_str() == "isa"))
            .map(|(key, value)| (key.as_str(), value)),
    );
    entries
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

/// Quote `s` unless it is safe to write bare.
pub fn quote(s: &str) -> String {
    if BARE_STRING.is_match(s) && !s.contains("//") && !s.contains("/*") {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Display names used to annotate object references, keyed by object id.
fn annotations(project: &PbxProject) -> HashMap<String, String> {
    let mut phase_of_build_file: HashMap<&str, &str> = HashMap::new();
    let mut list_owner: HashMap<&str, &Object> = HashMap::new();
    for (_, object) in project.objects() {
        if object.is_build_phase() {
            let phase = phase_name(object);
            for entry in object
                .fields()
                .get("files")
                .and_then(Value::as_array)
                .unwrap_or_default()
            {
                if let Some(id) = entry.as_str() {
                    phase_of_build_file.insert(id, phase);
                }
            }
        }
        if let Some(list) = object.get_str("buildConfigurationList") {
            list_owner.insert(list, object);
        }
    }

    let mut names = HashMap::new();
    for (id, object) in project.objects() {
        let name = match object.isa() {
            ISA_BUILD_FILE => {
                let file = object
                    .get_str("fileRef")
                    .and_then(|r| lookup(project, r))
                    .and_then(Object::display_name)
                    .or_else(|| {
                        object
                            .get_str("productRef")
                            .and_then(|r| lookup(project, r))
                            .and_then(|product| product.get_str("productName"))
                    });
                match (file, phase_of_build_file.get(id.as_str())) {
                    (Some(file), Some(phase)) => Some(format!("{file} in {phase}")),
                    _ => None,
                }
            }
            ISA_PROJECT => Some("Project object".to_string()),
            "XCConfigurationList" => list_owner.get(id.as_str()).and_then(|owner| {
                let owner_name = if owner.isa() == ISA_PROJECT {
                    project.name()
                } else {
                    owner.get_str("name")
                }?;
                Some(format!(
                    "Build configuration list for {} \"{}\"",
                    owner.isa(),
                    owner_name
                ))
            }),
            "PBXTargetDependency" | "PBXContainerItemProxy" => Some(object.isa().to_string()),
            "XCSwiftPackageProductDependency" => object.get_str("productName").map(str::to_string),
            _ if object.is_build_phase() => Some(phase_name(object).to_string()),
            _ => object.display_name().map(str::to_string),
        };
        if let Some(name) = name {
            names.insert(id.as_str().to_string(), name);
        }
    }
    names
}

fn lookup<'a>(project: &'a PbxProject, id: &str) -> Option<&'a Object> {
    project.object(&ObjectId::new(id)).ok()
}

fn phase_name(phase: &Object) -> &str {
    if let Some(name) = phase.get_str("name") {
        return name;
    }
    match phase.isa() {
        "PBXSourcesBuildPhase" => "Sources",
        "PBXFrameworksBuildPhase" => "Frameworks",
        "PBXResourcesBuildPhase" => "Resources",
        "PBXHeadersBuildPhase" => "Headers",
        "PBXCopyFilesBuildPhase" => "CopyFiles",
        "PBXShellScriptBuildPhase" => "ShellScript",
        "PBXRezBuildPhase" => "Rez",
        other => other,
    }
}
