/// 束縛名とプレフィックスから displayName の値を作る
///
/// 例: `synthesize("Button", "REMOD_")` -> `"REMOD_Button"`
pub fn synthesize(binding_name: &str, prefix: &str) -> String {
    let mut name = String::with_capacity(prefix.len() + binding_name.len());
    name.push_str(prefix);
    name.push_str(binding_name);
    name
}
