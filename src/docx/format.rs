use crate::config::IgnoredFormats;
use crate::model::FormatSet;

use super::notes::{NoteKind, NoteRef};
use super::styles::{AttrValues, PropMap, StyleProps, StyleTable, overlay, read_props};
use super::{WML_NS, wml, wml_attr};

/// A piece of a run after format resolution. Note references keep their id
/// until the note splicer numbers them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FormattedRun {
    pub(crate) text: String,
    pub(crate) format: FormatSet,
    pub(crate) note: Option<NoteRef>,
}

/// Unresolved run content: text and note references in document order.
#[derive(Debug, PartialEq, Eq)]
struct RunPiece {
    text: String,
    note: Option<NoteRef>,
}

fn run_pieces(run: roxmltree::Node) -> Vec<RunPiece> {
    let mut pieces = Vec::new();
    let mut pending_text = String::new();
    for child in run.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => pending_text.push_str(child.text().unwrap_or("")),
            "tab" => pending_text.push('\t'),
            "br" | "cr" => pending_text.push('\n'),
            "noBreakHyphen" => pending_text.push('-'),
            name @ ("footnoteReference" | "endnoteReference") => {
                if !pending_text.is_empty() {
                    pieces.push(RunPiece {
                        text: std::mem::take(&mut pending_text),
                        note: None,
                    });
                }
                let kind = if name == "footnoteReference" {
                    NoteKind::Footnote
                } else {
                    NoteKind::Endnote
                };
                match child
                    .attribute((WML_NS, "id"))
                    .and_then(|v| v.parse::<i64>().ok())
                {
                    Some(id) => pieces.push(RunPiece {
                        text: String::new(),
                        note: Some(NoteRef { kind, id }),
                    }),
                    None => log::warn!("Ignoring {name} without a numeric id"),
                }
            }
            _ => {}
        }
    }
    if !pending_text.is_empty() {
        pieces.push(RunPiece {
            text: pending_text,
            note: None,
        });
    }
    pieces
}

fn toggle_on(values: &AttrValues) -> bool {
    match values.get("val") {
        None => values.is_empty(),
        Some(v) => matches!(v.as_str(), "1" | "on" | "true"),
    }
}

/// Decodes effective run properties into canonical display attributes.
///
/// Toggles (`b`, `i`, `strike`, `dstrike`) are on when present with no
/// value or with `1`/`on`/`true`. Any underline whose value contains
/// "double" is a double underline, `none` removes underlining, every other
/// value (or none at all) is a single underline. `vertAlign` maps to sub- or
/// superscript on an exact value match. Ignored attributes never appear.
pub fn decode_props(props: &PropMap, ignored: &IgnoredFormats) -> FormatSet {
    let mut set = FormatSet::empty();
    for (name, values) in props {
        match name.as_str() {
            "b" if toggle_on(values) && !ignored.bold => set |= FormatSet::BOLD,
            "i" if toggle_on(values) && !ignored.italic => set |= FormatSet::ITALIC,
            "strike" if toggle_on(values) && !ignored.strikethrough => {
                set |= FormatSet::STRIKE
            }
            "dstrike" if toggle_on(values) && !ignored.double_strikethrough => {
                set |= FormatSet::DOUBLE_STRIKE
            }
            "u" => {
                let kind = values.get("val").map(String::as_str).unwrap_or("single");
                if kind.to_ascii_lowercase().contains("double") {
                    if !ignored.double_underline {
                        set |= FormatSet::DOUBLE_UNDERLINE;
                    }
                } else if kind != "none" && !ignored.underline {
                    set |= FormatSet::UNDERLINE;
                }
            }
            "vertAlign" => match values.get("val").map(String::as_str) {
                Some("subscript") if !ignored.subscript => set |= FormatSet::SUBSCRIPT,
                Some("superscript") if !ignored.superscript => set |= FormatSet::SUPERSCRIPT,
                _ => {}
            },
            _ => {}
        }
    }
    set
}

/// Resolves run formatting against one document's style table.
///
/// Run cascade, lowest first: document run defaults, paragraph style run
/// properties, character style (`rStyle`) properties, direct properties.
/// The paragraph cascade (paragraph defaults, paragraph style paragraph
/// properties) sits beneath the whole run result.
pub(crate) struct RunFormatter<'s> {
    styles: &'s StyleTable,
    ignored: IgnoredFormats,
}

impl<'s> RunFormatter<'s> {
    pub(crate) fn new(styles: &'s StyleTable, ignored: IgnoredFormats) -> Self {
        RunFormatter { styles, ignored }
    }

    fn paragraph_base(&self, para: roxmltree::Node) -> StyleProps {
        let style_id = wml(para, "pPr")
            .and_then(|ppr| wml_attr(ppr, "pStyle"))
            .or_else(|| self.styles.default_paragraph_style());
        match style_id {
            Some(id) => self.styles.effective(id),
            None => self.styles.defaults().clone(),
        }
    }

    /// Effective properties of a run given its paragraph's base cascade.
    fn effective_props(&self, base: &StyleProps, direct: &PropMap) -> PropMap {
        let mut run = base.run.clone();
        if let Some(char_style) = direct
            .get("rStyle")
            .and_then(|v| v.get("val"))
            .and_then(|id| self.styles.get(id))
        {
            overlay(&mut run, &char_style.run);
        }
        overlay(&mut run, direct);

        let mut props = base.paragraph.clone();
        overlay(&mut props, &run);
        props
    }

    /// Resolves `runs` (run nodes of `para`) into formatted pieces.
    pub(crate) fn format_runs(
        &self,
        para: roxmltree::Node,
        runs: &[roxmltree::Node],
    ) -> Vec<FormattedRun> {
        let base = self.paragraph_base(para);
        let mut out = Vec::new();
        for run in runs {
            let direct = wml(*run, "rPr").map(read_props).unwrap_or_default();
            let format = decode_props(&self.effective_props(&base, &direct), &self.ignored);
            out.extend(run_pieces(*run).into_iter().map(|piece| FormattedRun {
                text: piece.text,
                format,
                note: piece.note,
            }));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::styles::StyleDef;
    use crate::docx::{is_wml, test_xml};

    fn attrs(pairs: &[(&str, &str)]) -> AttrValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn one(name: &str, values: AttrValues) -> PropMap {
        PropMap::from([(name.to_string(), values)])
    }

    const CANONICAL: [(FormatSet, &str, Option<&str>); 8] = [
        (FormatSet::BOLD, "b", None),
        (FormatSet::ITALIC, "i", None),
        (FormatSet::STRIKE, "strike", None),
        (FormatSet::DOUBLE_STRIKE, "dstrike", None),
        (FormatSet::UNDERLINE, "u", Some("single")),
        (FormatSet::DOUBLE_UNDERLINE, "u", Some("double")),
        (FormatSet::SUBSCRIPT, "vertAlign", Some("subscript")),
        (FormatSet::SUPERSCRIPT, "vertAlign", Some("superscript")),
    ];

    /// Property map that decodes back to exactly `set`.
    fn canonical_props(set: FormatSet) -> PropMap {
        let mut props = PropMap::new();
        for (flag, name, val) in CANONICAL {
            if !set.contains(flag) {
                continue;
            }
            let values = val
                .map(|v| AttrValues::from([("val".to_string(), v.to_string())]))
                .unwrap_or_default();
            props.insert(name.to_string(), values);
        }
        props
    }

    #[test]
    fn toggle_values() {
        let none = IgnoredFormats::default();
        for on in ["1", "on", "true"] {
            assert_eq!(
                decode_props(&one("b", attrs(&[("val", on)])), &none),
                FormatSet::BOLD
            );
        }
        assert_eq!(decode_props(&one("b", attrs(&[])), &none), FormatSet::BOLD);
        for off in ["0", "false", "off"] {
            assert_eq!(
                decode_props(&one("i", attrs(&[("val", off)])), &none),
                FormatSet::empty()
            );
        }
    }

    #[test]
    fn underline_variants() {
        let none = IgnoredFormats::default();
        let u = |v: &str| decode_props(&one("u", attrs(&[("val", v)])), &none);
        assert_eq!(u("double"), FormatSet::DOUBLE_UNDERLINE);
        assert_eq!(u("wavyDouble"), FormatSet::DOUBLE_UNDERLINE);
        assert_eq!(u("DOUBLE"), FormatSet::DOUBLE_UNDERLINE);
        assert_eq!(u("dotted"), FormatSet::UNDERLINE);
        assert_eq!(u("single"), FormatSet::UNDERLINE);
        assert_eq!(u("none"), FormatSet::empty());
        assert_eq!(
            decode_props(&one("u", attrs(&[])), &none),
            FormatSet::UNDERLINE
        );
    }

    #[test]
    fn vertical_alignment_is_exclusive() {
        let none = IgnoredFormats::default();
        let v = |val: &str| decode_props(&one("vertAlign", attrs(&[("val", val)])), &none);
        assert_eq!(v("subscript"), FormatSet::SUBSCRIPT);
        assert_eq!(v("superscript"), FormatSet::SUPERSCRIPT);
        assert_eq!(v("baseline"), FormatSet::empty());
    }

    #[test]
    fn ignored_attributes_are_absent() {
        let ignored = IgnoredFormats {
            double_underline: true,
            bold: true,
            ..Default::default()
        };
        let mut props = one("u", attrs(&[("val", "double")]));
        props.insert("b".into(), attrs(&[]));
        props.insert("i".into(), attrs(&[]));
        props.insert("color".into(), attrs(&[("val", "FF0000")]));
        assert_eq!(decode_props(&props, &ignored), FormatSet::ITALIC);
    }

    #[test]
    fn decoding_canonical_props_is_idempotent() {
        let none = IgnoredFormats::default();
        for bits in 0..=u8::MAX {
            let set = FormatSet::from_bits_truncate(bits);
            if set.contains(FormatSet::SUBSCRIPT | FormatSet::SUPERSCRIPT)
                || set.contains(FormatSet::UNDERLINE | FormatSet::DOUBLE_UNDERLINE)
            {
                continue;
            }
            let once = decode_props(&canonical_props(set), &none);
            assert_eq!(once, set);
            assert_eq!(decode_props(&canonical_props(once), &none), once);
        }
    }

    fn style(id: &str, run: PropMap, paragraph: PropMap) -> StyleDef {
        StyleDef {
            id: id.into(),
            based_on: None,
            props: StyleProps { paragraph, run },
            default_paragraph: false,
        }
    }

    #[test]
    fn cascade_precedence() {
        let table = StyleTable::build(
            vec![
                style(
                    "Quote",
                    one("i", attrs(&[])),
                    one("strike", attrs(&[])),
                ),
                style("Emphasis", one("i", attrs(&[("val", "0")])), PropMap::new()),
            ],
            StyleProps {
                paragraph: one("dstrike", attrs(&[])),
                run: one("b", attrs(&[])),
            },
        );
        let formatter = RunFormatter::new(&table, IgnoredFormats::default());
        let xml = test_xml::document(
            r#"<w:p><w:pPr><w:pStyle w:val="Quote"/></w:pPr>
                 <w:r><w:t>a</w:t></w:r>
                 <w:r><w:rPr><w:rStyle w:val="Emphasis"/></w:rPr><w:t>b</w:t></w:r>
                 <w:r><w:rPr><w:rStyle w:val="Emphasis"/><w:i/><w:b w:val="false"/></w:rPr><w:t>c</w:t></w:r>
                 <w:r><w:rPr><w:strike w:val="0"/></w:rPr><w:t>d</w:t></w:r>
               </w:p>"#,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let p = doc.descendants().find(|n| is_wml(*n, "p")).unwrap();
        let runs: Vec<_> = p.children().filter(|n| is_wml(*n, "r")).collect();
        let formatted = formatter.format_runs(p, &runs);
        let codes: Vec<String> = formatted.iter().map(|r| r.format.codes()).collect();
        // defaults bold + paragraph-level strikes, style italic
        assert_eq!(codes[0], "bisz");
        // character style switches italic off
        assert_eq!(codes[1], "bsz");
        // direct properties win over the character style
        assert_eq!(codes[2], "isz");
        // run-level value overrides paragraph-level strike
        assert_eq!(codes[3], "biz");
    }

    #[test]
    fn note_references_split_runs() {
        let xml = test_xml::document(
            r#"<w:p><w:r><w:t>See</w:t><w:footnoteReference w:id="3"/><w:t>after</w:t><w:endnoteReference w:id="x"/></w:r></w:p>"#,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let r = doc.descendants().find(|n| is_wml(*n, "r")).unwrap();
        let pieces = run_pieces(r);
        assert_eq!(
            pieces,
            vec![
                RunPiece {
                    text: "See".into(),
                    note: None
                },
                RunPiece {
                    text: String::new(),
                    note: Some(NoteRef {
                        kind: NoteKind::Footnote,
                        id: 3
                    })
                },
                RunPiece {
                    text: "after".into(),
                    note: None
                },
            ]
        );
    }
}
