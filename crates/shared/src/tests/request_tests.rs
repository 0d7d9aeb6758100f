use super::*;

#[test]
fn wire_keys_parse_and_unknown_keys_name_themselves() {
    assert_eq!("COUNT".parse::<FacetSort>(), Ok(FacetSort::Count));
    assert_eq!("STARTS_WITH".parse::<OperationKey>(), Ok(OperationKey::StartsWith));

    let err = "SOMETIMES".parse::<OperationKey>().expect_err("unknown");
    assert_eq!(err, UnknownKey("SOMETIMES".into()));
    assert_eq!(err.to_string(), "unknown key `SOMETIMES`");

    let boxed: Box<dyn std::error::Error> = Box::new("count".parse::<FacetSort>().unwrap_err());
    assert_eq!(boxed.to_string(), "unknown key `count`");
}
