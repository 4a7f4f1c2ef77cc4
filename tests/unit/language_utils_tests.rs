/*!
 * Tests for language code utilities
 */

use bulk_translate::language_utils::{
    get_language_name, language_codes_match, primary_subtag, validate_language_code,
    LanguageCodeType,
};

#[test]
fn test_validate_language_code_withIso6391_shouldReturnPart1() {
    assert_eq!(validate_language_code("es").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code(" FR ").unwrap(), LanguageCodeType::Part1);
}

#[test]
fn test_validate_language_code_withIso6392_shouldReturnPart2() {
    assert_eq!(validate_language_code("spa").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("fre").unwrap(), LanguageCodeType::Part2B);
}

#[test]
fn test_validate_language_code_withInvalidCodes_shouldFail() {
    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("x").is_err());
    assert!(validate_language_code("zz9").is_err());
    assert!(validate_language_code("english").is_err());
}

#[test]
fn test_primary_subtag_shouldLowercaseAndStripRegion() {
    assert_eq!(primary_subtag("pt-BR"), "pt");
    assert_eq!(primary_subtag("zh_Hant"), "zh");
    assert_eq!(primary_subtag("de"), "de");
}

#[test]
fn test_language_codes_match_withDifferentForms_shouldMatch() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("pt-br", "pt"));
    assert!(language_codes_match("ger", "de"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("en", "invalid"));
}

#[test]
fn test_get_language_name_withRegionalCode_shouldReturnBaseLanguage() {
    assert_eq!(get_language_name("es").unwrap(), "Spanish");
    assert_eq!(get_language_name("pt-br").unwrap(), "Portuguese");
    assert!(get_language_name("xx").is_err());
}
