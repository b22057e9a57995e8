use scraper::{ElementRef, Html, Selector};
use ytsm_core::{FormEncoding, ModalForm};

const MULTIPART: &str = "multipart/form-data";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    #[error("fragment contains no form")]
    NoForm,
    #[error("form has no action")]
    MissingAction,
}

/// Reads the dialog's form out of a server-rendered modal fragment.
///
/// Picks the first `<form>`, its `action` and `enctype`, the names of its
/// inputs (file inputs listed apart), hidden input values, the `.modal-title`
/// text and whether an `#__modal_error` slot is present anywhere in the fragment.
pub fn parse_fragment(html: &str) -> Result<ModalForm, FragmentError> {
    let doc = Html::parse_fragment(html);
    let form = selector("form")
        .and_then(|sel| doc.select(&sel).next())
        .ok_or(FragmentError::NoForm)?;

    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .ok_or(FragmentError::MissingAction)?
        .to_string();

    let encoding = match form.value().attr("enctype") {
        Some(enctype) if enctype.eq_ignore_ascii_case(MULTIPART) => FormEncoding::Multipart,
        _ => FormEncoding::UrlEncoded,
    };

    let Inputs {
        fields,
        hidden,
        file_fields,
    } = collect_inputs(form);

    let title = selector(".modal-title")
        .and_then(|sel| doc.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty());

    let has_error_slot = selector("#__modal_error")
        .is_some_and(|sel| doc.select(&sel).next().is_some());

    Ok(ModalForm {
        action,
        encoding,
        fields,
        hidden,
        file_fields,
        title,
        has_error_slot,
    })
}

#[derive(Default)]
struct Inputs {
    fields: Vec<String>,
    hidden: Vec<(String, String)>,
    file_fields: Vec<String>,
}

fn collect_inputs(form: ElementRef<'_>) -> Inputs {
    let mut inputs = Inputs::default();
    let Some(sel) = selector("input[name], select[name], textarea[name]") else {
        return inputs;
    };

    for input in form.select(&sel) {
        let element = input.value();
        let Some(name) = element.attr("name") else {
            continue;
        };
        let input_type = if element.name() == "input" {
            element.attr("type").unwrap_or("text")
        } else {
            ""
        };
        if input_type.eq_ignore_ascii_case("hidden") {
            inputs
                .hidden
                .push((name.to_string(), element.attr("value").unwrap_or("").to_string()));
        } else if input_type.eq_ignore_ascii_case("file") {
            push_unique(&mut inputs.file_fields, name);
        } else {
            push_unique(&mut inputs.fields, name);
        }
    }
    inputs
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|known| known == name) {
        names.push(name.to_string());
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}
