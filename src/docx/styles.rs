use std::collections::{BTreeMap, HashMap};

use crate::error::Error;

use super::{WML_NS, is_wml, wml};

/// Attribute values of one formatting element, keyed by local name (`{"val": "double"}`).
pub type AttrValues = BTreeMap<String, String>;

/// Formatting elements keyed by local name (`{"b": {}, "u": {"val": "double"}}`).
pub type PropMap = BTreeMap<String, AttrValues>;

/// Run-property children that take part in comment formatting. `rStyle` is kept
/// so a run's character style can be looked up from its direct properties.
const FORMAT_ELEMENTS: [&str; 7] = ["rStyle", "b", "i", "u", "strike", "dstrike", "vertAlign"];

/// Reads the formatting children of an `rPr` node.
pub(crate) fn read_props(rpr: roxmltree::Node) -> PropMap {
    let mut props = PropMap::new();
    for child in rpr.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        let name = child.tag_name().name();
        if !FORMAT_ELEMENTS.contains(&name) {
            continue;
        }
        let values: AttrValues = child
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();
        props.insert(name.to_string(), values);
    }
    props
}

/// Overlays `upper` onto `base`; `upper` wins per formatting element.
pub(crate) fn overlay(base: &mut PropMap, upper: &PropMap) {
    for (name, values) in upper {
        base.insert(name.clone(), values.clone());
    }
}

/// Paragraph-level (`pPr/rPr`) and run-level (`rPr`) formatting of a style.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleProps {
    pub paragraph: PropMap,
    pub run: PropMap,
}

impl StyleProps {
    /// Style properties of a `w:style` or `w:docDefaults` shaped node.
    fn from_style_node(node: roxmltree::Node) -> Self {
        StyleProps {
            paragraph: wml(node, "pPr")
                .and_then(|ppr| wml(ppr, "rPr"))
                .map(read_props)
                .unwrap_or_default(),
            run: wml(node, "rPr").map(read_props).unwrap_or_default(),
        }
    }

    pub fn overlay(&mut self, upper: &StyleProps) {
        overlay(&mut self.paragraph, &upper.paragraph);
        overlay(&mut self.run, &upper.run);
    }
}

/// A style as written in `styles.xml`, before inheritance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleDef {
    pub id: String,
    pub based_on: Option<String>,
    pub props: StyleProps,
    pub default_paragraph: bool,
}

impl StyleDef {
    fn from_node(node: roxmltree::Node) -> Option<Self> {
        let id = node.attribute((WML_NS, "styleId"))?;
        let based_on = wml(node, "basedOn")
            .and_then(|n| n.attribute((WML_NS, "val")))
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let default_paragraph = node.attribute((WML_NS, "type")) == Some("paragraph")
            && matches!(node.attribute((WML_NS, "default")), Some("1" | "true" | "on"));
        Some(StyleDef {
            id: id.to_string(),
            based_on,
            props: StyleProps::from_style_node(node),
            default_paragraph,
        })
    }
}

/// Flattens the `basedOn` chain of `id`: ancestors first, nearer ancestors
/// override further ones, the style's own properties are applied last.
///
/// A missing `basedOn` target ends the chain. A cycle is an error.
pub fn resolve_style(defs: &HashMap<String, StyleDef>, id: &str) -> Result<StyleProps, Error> {
    resolve_memo(defs, id, &mut HashMap::new(), &mut Vec::new())
}

fn resolve_memo(
    defs: &HashMap<String, StyleDef>,
    id: &str,
    memo: &mut HashMap<String, StyleProps>,
    visiting: &mut Vec<String>,
) -> Result<StyleProps, Error> {
    if let Some(done) = memo.get(id) {
        return Ok(done.clone());
    }
    let Some(def) = defs.get(id) else {
        return Ok(StyleProps::default());
    };
    if visiting.iter().any(|v| v == id) {
        return Err(Error::StyleCycle {
            style_id: id.to_string(),
        });
    }

    visiting.push(id.to_string());
    let inherited = match def.based_on.as_deref() {
        Some(parent) if defs.contains_key(parent) => resolve_memo(defs, parent, memo, visiting),
        Some(parent) => {
            log::warn!("Style '{id}' is based on unknown style '{parent}'");
            Ok(StyleProps::default())
        }
        None => Ok(StyleProps::default()),
    };
    visiting.pop();

    let mut props = inherited?;
    props.overlay(&def.props);
    memo.insert(id.to_string(), props.clone());
    Ok(props)
}

/// Styles of one document with inheritance flattened, plus document defaults.
///
/// Stored styles do not include the defaults; callers layer them at the
/// bottom of their own cascade, see [`StyleTable::effective`].
#[derive(Debug, Default)]
pub(crate) struct StyleTable {
    defaults: StyleProps,
    styles: HashMap<String, StyleProps>,
    default_paragraph_style: Option<String>,
}

impl StyleTable {
    pub(crate) fn from_xml(styles_xml: Option<&roxmltree::Document>) -> Self {
        let Some(xml) = styles_xml else {
            return StyleTable::default();
        };
        let root = xml.root_element();

        let defaults = wml(root, "docDefaults")
            .map(|dd| StyleProps {
                paragraph: wml(dd, "pPrDefault")
                    .map(StyleProps::from_style_node)
                    .map(|p| p.paragraph)
                    .unwrap_or_default(),
                run: wml(dd, "rPrDefault")
                    .map(StyleProps::from_style_node)
                    .map(|p| p.run)
                    .unwrap_or_default(),
            })
            .unwrap_or_default();

        let defs: Vec<StyleDef> = root
            .children()
            .filter(|n| is_wml(*n, "style"))
            .filter_map(StyleDef::from_node)
            .collect();

        Self::build(defs, defaults)
    }

    pub(crate) fn build(defs: Vec<StyleDef>, defaults: StyleProps) -> Self {
        let default_paragraph_style = defs
            .iter()
            .find(|d| d.default_paragraph)
            .map(|d| d.id.clone());
        let defs: HashMap<String, StyleDef> =
            defs.into_iter().map(|d| (d.id.clone(), d)).collect();

        let mut memo = HashMap::new();
        let mut styles = HashMap::with_capacity(defs.len());
        for (id, def) in &defs {
            let props = match resolve_memo(&defs, id, &mut memo, &mut Vec::new()) {
                Ok(props) => props,
                Err(e) => {
                    log::warn!("{e}; using its own properties only");
                    def.props.clone()
                }
            };
            styles.insert(id.clone(), props);
        }

        StyleTable {
            defaults,
            styles,
            default_paragraph_style,
        }
    }

    pub(crate) fn defaults(&self) -> &StyleProps {
        &self.defaults
    }

    /// Flattened style without document defaults.
    pub(crate) fn get(&self, id: &str) -> Option<&StyleProps> {
        self.styles.get(id)
    }

    /// Flattened style over document defaults; unknown ids resolve to the defaults.
    pub(crate) fn effective(&self, id: &str) -> StyleProps {
        let mut props = self.defaults.clone();
        if let Some(style) = self.get(id) {
            props.overlay(style);
        }
        props
    }

    pub(crate) fn default_paragraph_style(&self) -> Option<&str> {
        self.default_paragraph_style.as_deref()
    }
}
