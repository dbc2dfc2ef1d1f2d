//! MSBuild project parsing: properties, package references, legacy assembly
//! references, and central package versions.
//!
//! Items are read ignoring their `Condition` attributes, so every reference a
//! project could declare under any configuration is reported.

use std::collections::BTreeMap;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use nuspect_util::errors::NuspectError;

const ROOT_ELEMENT: &str = "Project";
const MAX_EXPANSION_PASSES: usize = 20;

/// A parsed MSBuild project file (`.csproj`, `.fsproj`, `.props`, ...).
#[derive(Debug, Clone, Default)]
pub struct Project {
    /// Properties keyed by lower-cased name; MSBuild property names are case-insensitive.
    properties: BTreeMap<String, String>,
    pub package_references: Vec<PackageReference>,
    pub references: Vec<AssemblyReference>,
    pub package_versions: Vec<PackageVersion>,
}

/// A `<PackageReference>` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    pub include: String,
    pub version: Option<String>,
    pub version_override: Option<String>,
}

/// A legacy `<Reference>` item. `include` is the raw, unevaluated attribute,
/// typically an assembly identity such as
/// `Newtonsoft.Json, Version=9.0.0.0, Culture=neutral, PublicKeyToken=...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReference {
    pub include: String,
}

/// A `<PackageVersion>` item from a central package management file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersion {
    pub include: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    PackageReference,
    Reference,
    PackageVersion,
}

impl ItemKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "PackageReference" => Some(Self::PackageReference),
            "Reference" => Some(Self::Reference),
            "PackageVersion" => Some(Self::PackageVersion),
            _ => None,
        }
    }
}

/// An item as written in the file, before property expansion.
#[derive(Debug)]
struct RawItem {
    kind: ItemKind,
    include: String,
    metadata: Vec<(String, String)>,
}

impl RawItem {
    fn from_start(kind: ItemKind, e: &BytesStart<'_>) -> Result<Option<Self>, NuspectError> {
        let mut include = None;
        let mut metadata = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| NuspectError::Manifest {
                message: format!("Malformed attribute: {err}"),
            })?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|err| NuspectError::Manifest {
                    message: format!("Malformed attribute value: {err}"),
                })?
                .to_string();
            match key.as_str() {
                "Include" => include = Some(value),
                "Condition" | "Exclude" | "Update" | "Remove" => {}
                _ => metadata.push((key, value)),
            }
        }
        // `Update`/`Remove` items modify existing ones and declare nothing new
        Ok(include.map(|include| Self {
            kind,
            include,
            metadata,
        }))
    }

    fn metadata(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl Project {
    /// Load and parse a project file from disk.
    ///
    /// A missing or unreadable file is reported as a manifest error, the same
    /// as malformed XML.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content =
            nuspect_util::fs::read_text(path).map_err(|e| NuspectError::Manifest {
                message: format!("Failed to read {}: {e}", path.display()),
            })?;
        parse_project(&content)
    }

    /// Look up an evaluated property, case-insensitively.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether a property is set to `true` (case-insensitive).
    pub fn property_is_true(&self, name: &str) -> Option<bool> {
        self.property(name)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Expand `$(Name)` property references. Undefined properties expand to
    /// an empty string.
    pub fn expand(&self, input: &str) -> String {
        expand_properties(input, &self.properties)
    }

    fn push_item(&mut self, item: RawItem) {
        match item.kind {
            ItemKind::PackageReference => {
                let version = item.metadata("Version").map(|v| self.expand(v));
                let version_override = item.metadata("VersionOverride").map(|v| self.expand(v));
                for include in split_includes(&self.expand(&item.include)) {
                    self.package_references.push(PackageReference {
                        include,
                        version: version.clone(),
                        version_override: version_override.clone(),
                    });
                }
            }
            ItemKind::Reference => {
                if item.include.trim().is_empty() {
                    return;
                }
                self.references.push(AssemblyReference {
                    include: item.include,
                });
            }
            ItemKind::PackageVersion => {
                let version = item.metadata("Version").map(|v| self.expand(v));
                for include in split_includes(&self.expand(&item.include)) {
                    self.package_versions.push(PackageVersion {
                        include,
                        version: version.clone(),
                    });
                }
            }
        }
    }
}

fn split_includes(include: &str) -> Vec<String> {
    include
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn expand_properties(input: &str, properties: &BTreeMap<String, String>) -> String {
    let mut result = input.to_string();
    for _ in 0..MAX_EXPANSION_PASSES {
        let Some(start) = result.find("$(") else {
            break;
        };
        let Some(len) = result[start..].find(')') else {
            break;
        };
        let key = result[start + 2..start + len].trim().to_ascii_lowercase();
        let value = properties.get(&key).map(String::as_str).unwrap_or("");
        result = format!("{}{}{}", &result[..start], value, &result[start + len + 1..]);
    }
    result
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

/// Parse MSBuild project XML into a `Project`.
///
/// Fails with a manifest error when the XML is malformed, the document is
/// truncated, or the root element is not `<Project>`.
pub fn parse_project(xml: &str) -> miette::Result<Project> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut project = Project::default();
    let mut raw_items: Vec<RawItem> = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();
    let mut current_item: Option<RawItem> = None;
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = element_name(e);
                check_root(&path, &tag, &mut seen_root)?;
                path.push(tag.clone());
                text_buf.clear();

                if path.len() == 3 && path[1] == "ItemGroup" {
                    if let Some(kind) = ItemKind::from_tag(&tag) {
                        current_item = RawItem::from_start(kind, e)?;
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let tag = element_name(e);
                check_root(&path, &tag, &mut seen_root)?;
                let depth = path.len() + 1;

                if depth == 3 && path[1] == "ItemGroup" {
                    if let Some(kind) = ItemKind::from_tag(&tag) {
                        if let Some(item) = RawItem::from_start(kind, e)? {
                            raw_items.push(item);
                        }
                    }
                } else if depth == 3 && path[1] == "PropertyGroup" {
                    project.properties.insert(tag.to_ascii_lowercase(), String::new());
                } else if depth == 4 {
                    if let Some(ref mut item) = current_item {
                        item.metadata.push((tag, String::new()));
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| NuspectError::Manifest {
                    message: format!("Malformed text content: {err}"),
                })?;
                text_buf.push_str(&text);
            }
            Ok(Event::CData(ref e)) => {
                text_buf.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(_)) => {
                let depth = path.len();

                if depth == 3 && path[1] == "PropertyGroup" {
                    let name = path[2].to_ascii_lowercase();
                    let value = expand_properties(&text_buf, &project.properties);
                    project.properties.insert(name, value);
                } else if depth == 3 && path[1] == "ItemGroup" {
                    if let Some(item) = current_item.take() {
                        raw_items.push(item);
                    }
                } else if depth == 4 && path[1] == "ItemGroup" {
                    if let Some(ref mut item) = current_item {
                        item.metadata.push((path[3].clone(), text_buf.clone()));
                    }
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(NuspectError::Manifest {
                    message: format!("Failed to parse project XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    if !seen_root {
        return Err(NuspectError::Manifest {
            message: format!("Missing <{ROOT_ELEMENT}> root element"),
        }
        .into());
    }
    if !path.is_empty() {
        return Err(NuspectError::Manifest {
            message: format!("Unexpected end of document inside <{}>", path.join(">")),
        }
        .into());
    }

    for item in raw_items {
        project.push_item(item);
    }

    Ok(project)
}

fn check_root(path: &[String], tag: &str, seen_root: &mut bool) -> Result<(), NuspectError> {
    if !path.is_empty() {
        return Ok(());
    }
    if *seen_root {
        return Err(NuspectError::Manifest {
            message: format!("Unexpected element <{tag}> after the root element"),
        });
    }
    if tag != ROOT_ELEMENT {
        return Err(NuspectError::Manifest {
            message: format!("Expected <{ROOT_ELEMENT}> root element, found <{tag}>"),
        });
    }
    *seen_root = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDK_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <SerilogVersion>3.1.1</SerilogVersion>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="13.0.3" />
    <PackageReference Include="Serilog" Version="$(SerilogVersion)" />
    <PackageReference Include="Polly">
      <Version>8.2.0</Version>
    </PackageReference>
    <PackageReference Include="Microsoft.NETCore.App" />
  </ItemGroup>
</Project>"#;

    #[test]
    fn parses_package_references() {
        let project = parse_project(SDK_PROJECT).unwrap();
        assert_eq!(project.package_references.len(), 4);
        assert_eq!(project.package_references[0].include, "Newtonsoft.Json");
        assert_eq!(project.package_references[0].version.as_deref(), Some("13.0.3"));
        assert_eq!(project.package_references[3].version, None);
    }

    #[test]
    fn expands_properties_in_metadata() {
        let project = parse_project(SDK_PROJECT).unwrap();
        assert_eq!(project.package_references[1].version.as_deref(), Some("3.1.1"));
        assert_eq!(project.property("targetframework"), Some("net8.0"));
    }

    #[test]
    fn version_as_child_element() {
        let project = parse_project(SDK_PROJECT).unwrap();
        assert_eq!(project.package_references[2].include, "Polly");
        assert_eq!(project.package_references[2].version.as_deref(), Some("8.2.0"));
    }

    #[test]
    fn cdata_content_reads_as_text() {
        let xml = r#"<Project>
  <PropertyGroup>
    <PollyVersion><![CDATA[8.2.0]]></PollyVersion>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Serilog">
      <Version><![CDATA[3.1.1]]></Version>
    </PackageReference>
    <PackageReference Include="Polly" Version="$(PollyVersion)" />
  </ItemGroup>
</Project>"#;
        let project = parse_project(xml).unwrap();
        assert_eq!(project.package_references[0].version.as_deref(), Some("3.1.1"));
        assert_eq!(project.package_references[1].version.as_deref(), Some("8.2.0"));
    }

    #[test]
    fn version_override_and_case_insensitive_metadata() {
        let xml = r#"<Project>
  <ItemGroup>
    <PackageReference Include="A" versionoverride="2.0.0" />
    <PackageReference Include="B"><VersionOverride>3.0.0</VersionOverride></PackageReference>
  </ItemGroup>
</Project>"#;
        let project = parse_project(xml).unwrap();
        assert_eq!(project.package_references[0].version_override.as_deref(), Some("2.0.0"));
        assert_eq!(project.package_references[1].version_override.as_deref(), Some("3.0.0"));
    }

    #[test]
    fn conditions_are_ignored() {
        let xml = r#"<Project>
  <ItemGroup Condition="'$(TargetFramework)' == 'net48'">
    <PackageReference Include="System.ValueTuple" Version="4.5.0" Condition="false" />
  </ItemGroup>
</Project>"#;
        let project = parse_project(xml).unwrap();
        assert_eq!(project.package_references.len(), 1);
    }

    #[test]
    fn semicolon_separated_includes() {
        let xml = r#"<Project><ItemGroup>
  <PackageReference Include="A; B;;C" Version="1.0.0" />
</ItemGroup></Project>"#;
        let project = parse_project(xml).unwrap();
        let names: Vec<&str> = project
            .package_references
            .iter()
            .map(|r| r.include.as_str())
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn update_items_are_skipped() {
        let xml = r#"<Project><ItemGroup>
  <PackageReference Update="A" Version="2.0.0" />
</ItemGroup></Project>"#;
        let project = parse_project(xml).unwrap();
        assert!(project.package_references.is_empty());
    }

    #[test]
    fn legacy_references_keep_raw_include() {
        let xml = r#"<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup>
    <Reference Include="System" />
    <Reference Include="Newtonsoft.Json, Version=9.0.0.0, Culture=neutral, PublicKeyToken=30ad4fe6b2a6aeed">
      <HintPath>..\packages\Newtonsoft.Json.9.0.1\lib\net45\Newtonsoft.Json.dll</HintPath>
    </Reference>
  </ItemGroup>
</Project>"#;
        let project = parse_project(xml).unwrap();
        assert_eq!(project.references.len(), 2);
        assert_eq!(
            project.references[1].include,
            "Newtonsoft.Json, Version=9.0.0.0, Culture=neutral, PublicKeyToken=30ad4fe6b2a6aeed"
        );
    }

    #[test]
    fn package_versions() {
        let xml = r#"<Project>
  <PropertyGroup>
    <ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally>
  </PropertyGroup>
  <ItemGroup>
    <PackageVersion Include="Serilog" Version="3.1.1" />
  </ItemGroup>
</Project>"#;
        let project = parse_project(xml).unwrap();
        assert_eq!(project.property_is_true("ManagePackageVersionsCentrally"), Some(true));
        assert_eq!(project.package_versions[0].include, "Serilog");
        assert_eq!(project.package_versions[0].version.as_deref(), Some("3.1.1"));
    }

    #[test]
    fn undefined_property_expands_empty() {
        let project = Project::default();
        assert_eq!(project.expand("$(Missing)1.0"), "1.0");
    }

    #[test]
    fn malformed_xml_is_manifest_error() {
        let err = parse_project("<Project><ItemGroup></Project>").unwrap_err();
        assert!(err.to_string().contains("Manifest error"), "got: {err}");
    }

    #[test]
    fn truncated_document_is_manifest_error() {
        assert!(parse_project("<Project><ItemGroup>").is_err());
    }

    #[test]
    fn wrong_root_is_manifest_error() {
        let err = parse_project("<project></project>").unwrap_err();
        assert!(err.to_string().contains("root element"), "got: {err}");
    }

    #[test]
    fn empty_document_is_manifest_error() {
        assert!(parse_project("").is_err());
    }
}
