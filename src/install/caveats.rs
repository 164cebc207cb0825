use crate::descriptor::PackageDescriptor;

use super::paths::Layout;

/// The descriptor's post-install text with its placeholders resolved.
pub fn caveats(descriptor: &PackageDescriptor, layout: &Layout) -> Option<String> {
    let template = descriptor.caveats.as_deref()?;
    let name = descriptor.name.as_str();

    let text = template
        .replace("{pkgshare}", &layout.pkgshare(name).display().to_string())
        .replace("{etc}", &layout.etc(name).display().to_string())
        .replace("{bin}", &layout.bin().display().to_string())
        .replace("{lib}", &layout.lib().display().to_string())
        .replace("{prefix}", &layout.prefix().display().to_string());
    Some(text)
}
