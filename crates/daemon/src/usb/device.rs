//! HID report transport over rusb
//!
//! Opens the screen controller by VID/PID, takes the HID interface away from
//! the kernel driver and moves whole reports over its interrupt endpoints.
//! Devices without an interrupt OUT endpoint receive reports through a
//! SET_REPORT control transfer instead.

use common::{Error, Result, Transport};
use rusb::{Context, Direction, DeviceHandle, TransferType, UsbContext};
use std::time::Duration;
use tracing::{debug, info, warn};

const HID_CLASS: u8 = 0x03;

/// bmRequestType: host-to-device, class, interface
const SET_REPORT_REQUEST_TYPE: u8 = 0x21;
const SET_REPORT: u8 = 0x09;
const OUTPUT_REPORT: u16 = 0x02;

/// Endpoint as seen in the configuration descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    pub address: u8,
    pub direction: Direction,
    pub transfer_type: TransferType,
}

/// Interface as seen in the configuration descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub number: u8,
    pub class_code: u8,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoints used for report traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidEndpoints {
    pub interface: u8,
    pub in_endpoint: Option<u8>,
    pub out_endpoint: Option<u8>,
}

/// Pick the first HID interface and its interrupt endpoints
pub fn select_hid_endpoints(interfaces: &[InterfaceInfo]) -> Option<HidEndpoints> {
    let interface = interfaces.iter().find(|i| i.class_code == HID_CLASS)?;

    let find = |direction: Direction| {
        interface
            .endpoints
            .iter()
            .find(|e| e.direction == direction && e.transfer_type == TransferType::Interrupt)
            .map(|e| e.address)
    };

    Some(HidEndpoints {
        interface: interface.number,
        in_endpoint: find(Direction::In),
        out_endpoint: find(Direction::Out),
    })
}

/// wValue of a SET_REPORT request for an output report
pub fn set_report_value(report_id: u8) -> u16 {
    (OUTPUT_REPORT << 8) | report_id as u16
}

/// Open handle to the screen controller
pub struct HidDevice {
    handle: DeviceHandle<Context>,
    endpoints: HidEndpoints,
    write_timeout: Duration,
    detached_kernel_driver: bool,
}

impl HidDevice {
    /// Open the first device matching `vendor_id:product_id`
    pub fn open(vendor_id: u16, product_id: u16, write_timeout: Duration) -> Result<Self> {
        let open_error = |reason: String| Error::TransportOpen {
            vendor_id,
            product_id,
            reason,
        };

        let context = Context::new().map_err(|e| open_error(e.to_string()))?;
        let handle = context
            .open_device_with_vid_pid(vendor_id, product_id)
            .ok_or_else(|| open_error("device not found or not accessible".to_string()))?;

        let config = handle
            .device()
            .active_config_descriptor()
            .map_err(|e| open_error(format!("failed to get config descriptor: {}", e)))?;

        let interfaces: Vec<InterfaceInfo> = config
            .interfaces()
            .filter_map(|interface| interface.descriptors().next())
            .map(|desc| InterfaceInfo {
                number: desc.interface_number(),
                class_code: desc.class_code(),
                endpoints: desc
                    .endpoint_descriptors()
                    .map(|ep| EndpointInfo {
                        address: ep.address(),
                        direction: ep.direction(),
                        transfer_type: ep.transfer_type(),
                    })
                    .collect(),
            })
            .collect();

        let endpoints = select_hid_endpoints(&interfaces)
            .ok_or_else(|| open_error("no HID interface".to_string()))?;
        let interface = endpoints.interface;

        // Detach kernel driver if active
        let detached_kernel_driver = match handle.kernel_driver_active(interface) {
            Ok(true) => match handle.detach_kernel_driver(interface) {
                Ok(()) => {
                    debug!("Detached kernel driver from interface {}", interface);
                    true
                }
                Err(e) => {
                    warn!(
                        "Failed to detach kernel driver from interface {}: {}",
                        interface, e
                    );
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                debug!(
                    "Could not check kernel driver status for interface {}: {}",
                    interface, e
                );
                false
            }
        };

        handle.claim_interface(interface).map_err(|e| {
            open_error(match e {
                rusb::Error::Access => format!(
                    "permission denied claiming interface {} (check udev rules)",
                    interface
                ),
                rusb::Error::Busy => format!("interface {} is in use", interface),
                _ => format!("failed to claim interface {}: {}", interface, e),
            })
        })?;

        info!(
            "Opened {:04x}:{:04x} interface {} (in={:?}, out={:?})",
            vendor_id, product_id, interface, endpoints.in_endpoint, endpoints.out_endpoint
        );

        Ok(Self {
            handle,
            endpoints,
            write_timeout,
            detached_kernel_driver,
        })
    }
}

impl Transport for HidDevice {
    fn write_report(&mut self, report: &[u8]) -> Result<usize> {
        let result = match self.endpoints.out_endpoint {
            Some(endpoint) => self
                .handle
                .write_interrupt(endpoint, report, self.write_timeout),
            None => {
                let report_id = report.first().copied().unwrap_or(0);
                self.handle.write_control(
                    SET_REPORT_REQUEST_TYPE,
                    SET_REPORT,
                    set_report_value(report_id),
                    self.endpoints.interface as u16,
                    report,
                    self.write_timeout,
                )
            }
        };

        result.map_err(|e| Error::TransportWrite(e.to_string()))
    }

    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>> {
        let Some(endpoint) = self.endpoints.in_endpoint else {
            return Ok(None);
        };

        match self.handle.read_interrupt(endpoint, buf, timeout) {
            Ok(len) => Ok(Some(len)),
            Err(rusb::Error::Timeout) => Ok(None),
            Err(e) => Err(Error::TransportRead(e.to_string())),
        }
    }
}

impl Drop for HidDevice {
    fn drop(&mut self) {
        let interface = self.endpoints.interface;
        if let Err(e) = self.handle.release_interface(interface) {
            warn!("Failed to release interface {}: {}", interface, e);
        }

        // Reattach kernel driver to restore device to kernel control
        if self.detached_kernel_driver
            && let Err(e) = self.handle.attach_kernel_driver(interface)
        {
            debug!(
                "Could not reattach kernel driver to interface {}: {}",
                interface, e
            );
        }
    }
}

/// Attached USB device, as printed by `--list-devices`
#[derive(Debug, Clone)]
pub struct DeviceSummary {
    pub bus_number: u8,
    pub device_address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// Enumerate attached USB devices
pub fn list_devices() -> rusb::Result<Vec<DeviceSummary>> {
    let context = Context::new()?;
    let devices = context.devices()?;

    let mut summaries = Vec::new();
    for device in devices.iter() {
        let descriptor = match device.device_descriptor() {
            Ok(d) => d,
            Err(e) => {
                debug!("Skipping device without descriptor: {}", e);
                continue;
            }
        };

        // Try to open device temporarily to read strings
        let (manufacturer, product) = match device.open() {
            Ok(handle) => (
                descriptor
                    .manufacturer_string_index()
                    .and_then(|idx| handle.read_string_descriptor_ascii(idx).ok()),
                descriptor
                    .product_string_index()
                    .and_then(|idx| handle.read_string_descriptor_ascii(idx).ok()),
            ),
            Err(_) => (None, None),
        };

        summaries.push(DeviceSummary {
            bus_number: device.bus_number(),
            device_address: device.address(),
            vendor_id: descriptor.vendor_id(),
            product_id: descriptor.product_id(),
            manufacturer,
            product,
        });
    }

    Ok(summaries)
}
