//! Descriptors shipped with keg.

use super::{InstallStep, Location, PackageDescriptor, SmokeTest};

pub const ANSIBLE_BUNDLER: &str = "ansible-bundler";

const ANSIBLE_BUNDLER_CAVEATS: &str = "\
Example usage:

# Employ the basic playbook example
bundle-playbook -f {pkgshare}/examples -o basic

# Run the basic playbook binary and provide an input for the example variable.
./basic -e example=VALUE
";

/// Names of every built-in descriptor.
pub fn names() -> &'static [&'static str] {
    &[ANSIBLE_BUNDLER]
}

pub fn find(name: &str) -> Option<PackageDescriptor> {
    match name {
        ANSIBLE_BUNDLER => Some(ansible_bundler()),
        _ => None,
    }
}

pub fn ansible_bundler() -> PackageDescriptor {
    PackageDescriptor {
        name: ANSIBLE_BUNDLER.to_string(),
        description: "Ansible Bundler provides the ability to bundle and execute an Ansible Playbook as a binary."
            .to_string(),
        homepage: "https://github.com/cowdogmoo/ansible-bundler".to_string(),
        url: "https://github.com/cowdogmoo/ansible-bundler/archive/refs/heads/master.tar.gz"
            .to_string(),
        sha256: "742f9b70a400a45790bf90e7901635f2686ec339a906edfd8d4fc6afe1e109bb".to_string(),
        version: "2023.04.26".to_string(),
        license: Some("BSD-3-Clause".to_string()),
        depends_on: Some("python@3.11".to_string()),
        install: vec![
            InstallStep::install("app/bin/bundle-playbook", Location::Bin),
            InstallStep::install("app/lib/*", Location::Lib),
            InstallStep::install("app/etc/ansible.cfg", Location::Etc),
            InstallStep::inreplace(
                "bin/bundle-playbook",
                "#!/usr/bin/env bash",
                "#!/usr/bin/env zsh",
            ),
            InstallStep::install("examples", Location::Pkgshare),
        ],
        caveats: Some(ANSIBLE_BUNDLER_CAVEATS.to_string()),
        test: SmokeTest {
            binary: "bundle-playbook".to_string(),
            args: vec!["--version".to_string()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_descriptors_validate() {
        for name in names() {
            let descriptor = find(name).unwrap();
            assert_eq!(&descriptor.name, name);
            descriptor.validate().unwrap();
        }
    }

    #[test]
    fn test_ansible_bundler_step_order() {
        let steps: Vec<String> = ansible_bundler()
            .install
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            steps,
            vec![
                "bin.install app/bin/bundle-playbook",
                "lib.install app/lib/*",
                "etc.install app/etc/ansible.cfg",
                r##"inreplace bin/bundle-playbook "#!/usr/bin/env bash" -> "#!/usr/bin/env zsh""##,
                "pkgshare.install examples",
            ]
        );
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(find("not-a-package").is_none());
    }
}
