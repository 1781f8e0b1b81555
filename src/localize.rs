//! Fluent localization for every user-facing string

use std::sync::LazyLock;

use i18n_embed::{
    DefaultLocalizer, LanguageLoader, Localizer,
    fluent::{FluentLanguageLoader, fluent_language_loader},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "i18n/"]
struct Localizations;

pub static LANGUAGE_LOADER: LazyLock<FluentLanguageLoader> = LazyLock::new(|| {
    let loader: FluentLanguageLoader = fluent_language_loader!();

    loader
        .load_fallback_language(&Localizations)
        .expect("Error while loading fallback language");

    // Status lines are plain text, so no bidi isolation marks around placeables
    loader.set_use_isolating(false);

    loader
});

/// Look up a localized message, optionally with Fluent arguments
#[macro_export]
macro_rules! fl {
    ($message_id:literal) => {{
        i18n_embed_fl::fl!($crate::localize::LANGUAGE_LOADER, $message_id)
    }};

    ($message_id:literal, $($args:expr),*) => {{
        i18n_embed_fl::fl!($crate::localize::LANGUAGE_LOADER, $message_id, $($args), *)
    }};
}

/// Get the `Localizer` to be used for localizing this crate
pub fn localizer() -> Box<dyn Localizer> {
    Box::new(DefaultLocalizer::new(&*LANGUAGE_LOADER, &Localizations))
}

/// Select the best catalogue for the desktop's requested languages
pub fn localize() {
    let localizer = localizer();
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    if let Err(error) = localizer.select(&requested_languages) {
        log::warn!("Error while loading language for dialsnap: {}", error);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_fallback_catalogue_loads() {
        assert_eq!(crate::fl!("status-ocr-complete"), "OCR Complete.");
    }

    #[test]
    fn test_arguments_are_not_isolated() {
        let status = crate::fl!("status-recognizing", percent = 42);
        assert_eq!(status, "Recognizing: 42%");
    }
}
