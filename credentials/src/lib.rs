#![no_std]
#![allow(non_upper_case_globals)]

#[derive(Clone, Copy)]
pub enum TrustedNetworkIndices {
    Home = 0,
    Workshop = 1,
    COUNT = 2,
}

#[derive(Clone, Copy)]
pub struct TrustedNetwork {
    ssid: &'static str,
}

impl TrustedNetwork {
    pub fn get_ssid(&self) -> &'static str {
        self.ssid
    }
}

pub static trusted_networks: [TrustedNetwork; TrustedNetworkIndices::COUNT as usize] = [
    TrustedNetwork { ssid: "Dummy Home Network" },
    TrustedNetwork { ssid: "Dummy Workshop Network" },
];

pub fn home_network() -> TrustedNetwork {
    trusted_networks[TrustedNetworkIndices::Home as usize]
}
