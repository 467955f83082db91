// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// The Azure public cloud.
pub const AZURE_PUBLIC: &str = "AzureCloud";
/// Azure operated by 21Vianet.
pub const AZURE_CHINA: &str = "AzureChinaCloud";
/// Azure Government.
pub const AZURE_US_GOVERNMENT: &str = "AzureUSGovernment";

const AUTHORITY_HOSTS: &[(&str, &str)] = &[
    (AZURE_PUBLIC, "https://login.microsoftonline.com/"),
    (AZURE_CHINA, "https://login.chinacloudapi.cn/"),
    (AZURE_US_GOVERNMENT, "https://login.microsoftonline.us/"),
];

/// Returns the Microsoft Entra authority host for `cloud`, or `None` if the
/// cloud is not known.
///
/// Cloud names are matched exactly.
pub fn authority_host(cloud: &str) -> Option<&'static str> {
    AUTHORITY_HOSTS
        .iter()
        .find(|(name, _)| *name == cloud)
        .map(|(_, host)| *host)
}

/// The names of all known clouds.
pub fn known_clouds() -> impl Iterator<Item = &'static str> {
    AUTHORITY_HOSTS.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(AZURE_PUBLIC, "https://login.microsoftonline.com/")]
    #[test_case(AZURE_CHINA, "https://login.chinacloudapi.cn/")]
    #[test_case(AZURE_US_GOVERNMENT, "https://login.microsoftonline.us/")]
    fn known(cloud: &str, want: &str) {
        assert_eq!(authority_host(cloud), Some(want));
    }

    #[test_case("InvalidCloud")]
    #[test_case("")]
    #[test_case("azurecloud")]
    fn unknown(cloud: &str) {
        assert_eq!(authority_host(cloud), None);
    }

    #[test]
    fn every_known_cloud_has_a_host() {
        for cloud in known_clouds() {
            let host = authority_host(cloud).unwrap();
            assert!(host.starts_with("https://"), "{cloud} => {host}");
            assert!(host.ends_with('/'), "{cloud} => {host}");
        }
    }
}
